//! Reddit API client: password-grant login and full comment-tree retrieval.
//!
//! Reddit only returns part of a large comment tree per request and leaves
//! `more` placeholders for the rest. [`RedditClient::fetch_comments`] keeps
//! resolving those placeholders until every comment body is in hand, so the
//! caller always gets a complete, flat, breadth-first list.

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

const AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const OAUTH_API: &str = "https://oauth.reddit.com";
const COMMENT_LIMIT: u32 = 500;
const MORE_CHILDREN_BATCH: usize = 100;

pub const DEFAULT_USER_AGENT: &str = "rust:reddit_stack:v1.0 (tech stack extractor)";

/// Missing inputs detected before any request is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Either username or password not provided")]
    MissingLogin,

    #[error("Either client id or client key not provided")]
    MissingClient,

    #[error("Thread id not provided")]
    MissingThread,
}

/// Script-app credentials for the password grant.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl Credentials {
    /// Build credentials from optional inputs. Empty strings count as
    /// missing. `user_agent` falls back to [`DEFAULT_USER_AGENT`].
    pub fn from_parts(
        username: Option<String>,
        password: Option<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
        user_agent: Option<String>,
    ) -> Result<Self, CredentialError> {
        let (username, password) = match (non_empty(username), non_empty(password)) {
            (Some(u), Some(p)) => (u, p),
            _ => return Err(CredentialError::MissingLogin),
        };
        let (client_id, client_secret) = match (non_empty(client_id), non_empty(client_secret)) {
            (Some(id), Some(secret)) => (id, secret),
            _ => return Err(CredentialError::MissingClient),
        };

        Ok(Self {
            username,
            password,
            client_id,
            client_secret,
            user_agent: non_empty(user_agent).unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// One comment as handed to the extraction pipeline. Only `body` is used
/// there; the rest is kept for reporting and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawComment {
    pub id: String,
    pub author: Option<String>,
    pub depth: u32,
    pub body: String,
}

/// Accept a bare id (`abc123`), a fullname (`t3_abc123`) or a thread URL
/// and return the bare id.
///
/// # Example
/// ```
/// use reddit_stack_lib::parse_thread_id;
/// let id = parse_thread_id("https://www.reddit.com/r/dataengineering/comments/1abcde/quarterly_salary/").unwrap();
/// assert_eq!(id, "1abcde");
/// ```
pub fn parse_thread_id(input: &str) -> Result<String> {
    let input = input.trim().trim_end_matches('/');
    if input.is_empty() {
        return Err(CredentialError::MissingThread.into());
    }

    let url_re = Regex::new(r"(?:/comments/|redd\.it/)([A-Za-z0-9]+)")
        .context("Invalid thread URL pattern")?;
    if let Some(caps) = url_re.captures(input) {
        return Ok(caps[1].to_string());
    }

    let id = input.strip_prefix("t3_").unwrap_or(input);
    if id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(id.to_string())
    } else {
        Err(anyhow!("Invalid thread id: {}", input))
    }
}

// API Response types
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<RawThing>,
}

#[derive(Debug, Deserialize)]
struct RawThing {
    kind: String,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    id: String,
    name: String,
    author: Option<String>,
    #[serde(default)]
    body: String,
    #[serde(default)]
    depth: u32,
    parent_id: Option<String>,
    #[serde(default)]
    replies: Value,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenResponse {
    json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenJson {
    #[serde(default)]
    errors: Vec<Value>,
    data: Option<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenData {
    #[serde(default)]
    things: Vec<RawThing>,
}

/// A `more` placeholder standing for comments not included in a response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MoreStub {
    pub id: String,
    pub parent_id: String,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub count: u32,
}

impl MoreStub {
    /// "Continue this thread" stubs carry no child ids; their comments have
    /// to be fetched as a subtree of the parent.
    pub fn is_continue_thread(&self) -> bool {
        self.children.is_empty()
    }

    /// Id of the comment a continuation hangs below. `None` when the parent is
    /// not a comment (`t3_` submission), which has no subtree to fetch.
    pub fn continuation_parent(&self) -> Option<&str> {
        self.parent_id.strip_prefix("t1_")
    }
}

#[derive(Debug)]
enum Thing {
    Comment(Comment),
    More(MoreStub),
}

#[derive(Debug)]
struct Comment {
    raw: RawComment,
    fullname: String,
    parent_id: Option<String>,
    replies: Vec<Thing>,
}

impl Thing {
    fn parent_id(&self) -> Option<&str> {
        match self {
            Thing::Comment(c) => c.parent_id.as_deref(),
            Thing::More(m) => Some(m.parent_id.as_str()),
        }
    }
}

fn parse_things(raw: Vec<RawThing>) -> Result<Vec<Thing>> {
    let mut things = Vec::with_capacity(raw.len());
    for thing in raw {
        match thing.kind.as_str() {
            "t1" => {
                let data: CommentData =
                    serde_json::from_value(thing.data).context("Failed to parse comment")?;
                let replies = match data.replies {
                    Value::Object(_) => {
                        let listing: Listing = serde_json::from_value(data.replies)
                            .context("Failed to parse comment replies")?;
                        parse_things(listing.data.children)?
                    }
                    _ => Vec::new(),
                };
                things.push(Thing::Comment(Comment {
                    raw: RawComment {
                        id: data.id,
                        author: data.author,
                        depth: data.depth,
                        body: data.body,
                    },
                    fullname: data.name,
                    parent_id: data.parent_id,
                    replies,
                }));
            }
            "more" => {
                let stub: MoreStub =
                    serde_json::from_value(thing.data).context("Failed to parse more stub")?;
                things.push(Thing::More(stub));
            }
            other => debug!("Skipping listing entry of kind {}", other),
        }
    }
    Ok(things)
}

/// Parse the `/comments/{id}` response: `[submission listing, comment listing]`.
fn parse_comment_listing(body: Value) -> Result<Vec<Thing>> {
    let mut listings: Vec<Listing> =
        serde_json::from_value(body).context("Unexpected comment listing shape")?;
    if listings.len() < 2 {
        return Err(anyhow!(
            "Expected submission and comment listings, got {}",
            listings.len()
        ));
    }
    let comments = listings.swap_remove(1);
    parse_things(comments.data.children)
}

/// Parse `/api/morechildren` and rebuild the reply tree from its flat list
/// of things using their parent ids.
fn parse_more_children(body: Value) -> Result<Vec<Thing>> {
    let response: MoreChildrenResponse =
        serde_json::from_value(body).context("Unexpected morechildren response shape")?;
    if !response.json.errors.is_empty() {
        return Err(anyhow!(
            "Reddit rejected morechildren request: {:?}",
            response.json.errors
        ));
    }
    let things = parse_things(
        response
            .json
            .data
            .map(|d| d.things)
            .unwrap_or_default(),
    )?;
    Ok(assemble_tree(things))
}

fn assemble_tree(things: Vec<Thing>) -> Vec<Thing> {
    let fullnames: HashSet<String> = things
        .iter()
        .filter_map(|t| match t {
            Thing::Comment(c) => Some(c.fullname.clone()),
            Thing::More(_) => None,
        })
        .collect();

    // Children always follow their parent, so walking backwards every
    // child is placed before its parent is reached.
    let mut pending: HashMap<String, Vec<Thing>> = HashMap::new();
    let mut roots = Vec::new();
    for mut thing in things.into_iter().rev() {
        if let Thing::Comment(comment) = &mut thing {
            if let Some(mut children) = pending.remove(&comment.fullname) {
                children.reverse();
                comment.replies.extend(children);
            }
        }
        let parent = thing
            .parent_id()
            .filter(|p| fullnames.contains(*p))
            .map(str::to_string);
        match parent {
            Some(parent) => pending.entry(parent).or_default().push(thing),
            None => roots.push(thing),
        }
    }
    roots.reverse();
    roots
}

/// Breadth-first accumulation of comments, deduplicated by id, with the
/// `more` stubs still to resolve.
#[derive(Debug, Default)]
struct CommentCollector {
    comments: Vec<RawComment>,
    seen: HashSet<String>,
    pending: VecDeque<MoreStub>,
}

impl CommentCollector {
    fn absorb(&mut self, roots: Vec<Thing>) {
        let mut queue: VecDeque<Thing> = roots.into();
        while let Some(thing) = queue.pop_front() {
            match thing {
                Thing::Comment(comment) => {
                    queue.extend(comment.replies);
                    if self.seen.insert(comment.raw.id.clone()) {
                        self.comments.push(comment.raw);
                    }
                }
                Thing::More(stub) => self.pending.push_back(stub),
            }
        }
    }
}

/// Authenticated Reddit session.
pub struct RedditClient {
    client: reqwest::Client,
    token: String,
}

impl RedditClient {
    /// Obtain an OAuth token with the password grant.
    pub async fn login(credentials: &Credentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(credentials.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client")?;

        let response: TokenResponse = client
            .post(AUTH_URL)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await?
            .error_for_status()
            .context("Failed to authenticate with Reddit")?
            .json()
            .await?;

        let token = match (response.access_token, response.error) {
            (Some(token), _) => token,
            (None, Some(error)) => return Err(anyhow!("Reddit rejected the login: {}", error)),
            (None, None) => return Err(anyhow!("Reddit returned no access token")),
        };

        Ok(Self { client, token })
    }

    /// Name of the authenticated account.
    pub async fn me(&self) -> Result<String> {
        let url = format!("{}/api/v1/me", OAUTH_API);
        let body = self.get_json(&url).await.context("Failed to fetch account")?;
        let me: MeResponse = serde_json::from_value(body).context("Unexpected account response")?;
        Ok(me.name)
    }

    /// Fetch every comment of a thread, resolving all `more` stubs.
    pub async fn fetch_comments(&self, thread_id: &str) -> Result<Vec<RawComment>> {
        self.fetch_comments_with_progress(thread_id, |_, _| {}).await
    }

    /// Like [`fetch_comments`](Self::fetch_comments), calling `progress`
    /// with (comments fetched, stubs pending) after each request.
    pub async fn fetch_comments_with_progress<F>(
        &self,
        thread_id: &str,
        mut progress: F,
    ) -> Result<Vec<RawComment>>
    where
        F: FnMut(usize, usize),
    {
        let url = format!(
            "{}/comments/{}?limit={}&sort=confidence&raw_json=1",
            OAUTH_API,
            urlencoding::encode(thread_id),
            COMMENT_LIMIT
        );
        let body = self.get_json(&url).await.context("Failed to fetch thread")?;

        let mut collector = CommentCollector::default();
        collector.absorb(parse_comment_listing(body)?);
        progress(collector.comments.len(), collector.pending.len());

        let mut expanded_parents = HashSet::new();
        while let Some(stub) = collector.pending.pop_front() {
            if stub.is_continue_thread() {
                let Some(parent) = stub.continuation_parent() else {
                    warn!("Skipping continuation with non-comment parent {}", stub.parent_id);
                    continue;
                };
                if !expanded_parents.insert(parent.to_string()) {
                    warn!("Skipping repeated continuation of {}", stub.parent_id);
                    continue;
                }
                let roots = self.fetch_subtree(thread_id, parent).await?;
                collector.absorb(roots);
            } else {
                for batch in stub.children.chunks(MORE_CHILDREN_BATCH) {
                    let roots = self.fetch_more_children(thread_id, batch).await?;
                    collector.absorb(roots);
                }
            }
            progress(collector.comments.len(), collector.pending.len());
        }

        info!(
            "Fetched {} comments from thread {}",
            collector.comments.len(),
            thread_id
        );
        Ok(collector.comments)
    }

    async fn fetch_more_children(&self, thread_id: &str, children: &[String]) -> Result<Vec<Thing>> {
        debug!("Resolving {} more children", children.len());
        let url = format!(
            "{}/api/morechildren?api_type=json&link_id=t3_{}&children={}&limit_children=false&raw_json=1",
            OAUTH_API,
            urlencoding::encode(thread_id),
            urlencoding::encode(&children.join(","))
        );
        let body = self
            .get_json(&url)
            .await
            .context("Failed to fetch more comments")?;
        parse_more_children(body)
    }

    async fn fetch_subtree(&self, thread_id: &str, parent: &str) -> Result<Vec<Thing>> {
        debug!("Continuing thread below comment {}", parent);
        let url = format!(
            "{}/comments/{}?comment={}&limit={}&raw_json=1",
            OAUTH_API,
            urlencoding::encode(thread_id),
            urlencoding::encode(parent),
            COMMENT_LIMIT
        );
        let body = self
            .get_json(&url)
            .await
            .context("Failed to continue thread")?;
        parse_comment_listing(body)
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let body = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comment(id: &str, parent: &str, body: &str, replies: Value) -> Value {
        json!({
            "kind": "t1",
            "data": {
                "id": id,
                "name": format!("t1_{}", id),
                "author": "someone",
                "body": body,
                "depth": 0,
                "parent_id": parent,
                "replies": replies,
            }
        })
    }

    fn listing(children: Vec<Value>) -> Value {
        json!({ "kind": "Listing", "data": { "children": children } })
    }

    fn collect(roots: Vec<Thing>) -> CommentCollector {
        let mut collector = CommentCollector::default();
        collector.absorb(roots);
        collector
    }

    #[test]
    fn test_parse_thread_id_forms() {
        assert_eq!(parse_thread_id("abc123").unwrap(), "abc123");
        assert_eq!(parse_thread_id("t3_abc123").unwrap(), "abc123");
        assert_eq!(
            parse_thread_id("https://www.reddit.com/r/dataengineering/comments/abc123/title/").unwrap(),
            "abc123"
        );
        assert_eq!(parse_thread_id("https://redd.it/abc123").unwrap(), "abc123");
        assert!(parse_thread_id("not a thread").is_err());
    }

    #[test]
    fn test_parse_thread_id_missing() {
        let err = parse_thread_id("  ").unwrap_err();
        assert_eq!(
            err.downcast_ref::<CredentialError>(),
            Some(&CredentialError::MissingThread)
        );
    }

    #[test]
    fn test_credentials_validation_order() {
        let some = |s: &str| Some(s.to_string());
        assert_eq!(
            Credentials::from_parts(None, some("pw"), None, None, None).unwrap_err(),
            CredentialError::MissingLogin
        );
        assert_eq!(
            Credentials::from_parts(some("u"), some("pw"), some("id"), some(""), None).unwrap_err(),
            CredentialError::MissingClient
        );
        let creds =
            Credentials::from_parts(some("u"), some("pw"), some("id"), some("key"), None).unwrap();
        assert_eq!(creds.user_agent, DEFAULT_USER_AGENT);
        assert!(!format!("{:?}", creds).contains("pw"));
    }

    #[test]
    fn test_listing_walk_is_breadth_first() {
        let body = json!([
            listing(vec![json!({ "kind": "t3", "data": { "id": "abc" } })]),
            listing(vec![
                comment("a", "t3_abc", "first", listing(vec![comment("a1", "t1_a", "reply", json!(""))])),
                comment("b", "t3_abc", "second", json!("")),
                json!({
                    "kind": "more",
                    "data": { "id": "m1", "parent_id": "t3_abc", "children": ["c", "d"], "count": 2 }
                }),
            ]),
        ]);

        let collector = collect(parse_comment_listing(body).unwrap());
        let bodies: Vec<&str> = collector.comments.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second", "reply"]);
        assert_eq!(collector.pending.len(), 1);
        assert_eq!(collector.pending[0].children, vec!["c", "d"]);
    }

    #[test]
    fn test_comment_listing_needs_two_listings() {
        let body = json!([listing(vec![])]);
        assert!(parse_comment_listing(body).is_err());
    }

    #[test]
    fn test_more_children_rebuilds_tree() {
        let body = json!({
            "json": {
                "errors": [],
                "data": {
                    "things": [
                        comment("c", "t3_abc", "c body", json!("")),
                        comment("c1", "t1_c", "c1 body", json!("")),
                        comment("d", "t3_abc", "d body", json!("")),
                        {
                            "kind": "more",
                            "data": { "id": "_", "parent_id": "t1_c1", "children": [], "count": 0 }
                        }
                    ]
                }
            }
        });

        let roots = parse_more_children(body).unwrap();
        assert_eq!(roots.len(), 2);

        let collector = collect(roots);
        let ids: Vec<&str> = collector.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d", "c1"]);
        assert_eq!(collector.pending.len(), 1);
        assert!(collector.pending[0].is_continue_thread());
    }

    #[test]
    fn test_continuation_parent_must_be_comment() {
        let below_comment: MoreStub = serde_json::from_value(
            json!({ "id": "_", "parent_id": "t1_c1", "children": [], "count": 0 }),
        )
        .unwrap();
        assert!(below_comment.is_continue_thread());
        assert_eq!(below_comment.continuation_parent(), Some("c1"));

        let below_submission: MoreStub = serde_json::from_value(
            json!({ "id": "_", "parent_id": "t3_abc", "children": [], "count": 0 }),
        )
        .unwrap();
        assert!(below_submission.is_continue_thread());
        assert_eq!(below_submission.continuation_parent(), None);
    }

    #[test]
    fn test_more_children_errors() {
        let body = json!({ "json": { "errors": [["RATELIMIT", "slow down"]] } });
        assert!(parse_more_children(body).is_err());
    }

    #[test]
    fn test_collector_skips_seen_comments_but_walks_replies() {
        let mut collector = collect(parse_things(vec![serde_json::from_value(comment(
            "a", "t3_abc", "first", json!(""),
        ))
        .unwrap()])
        .unwrap());

        let again = serde_json::from_value(comment(
            "a",
            "t3_abc",
            "first",
            listing(vec![comment("a1", "t1_a", "deep", json!(""))]),
        ))
        .unwrap();
        collector.absorb(parse_things(vec![again]).unwrap());

        let bodies: Vec<&str> = collector.comments.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "deep"]);
    }

    #[test]
    fn test_deleted_comment_keeps_empty_author() {
        let raw = json!({
            "kind": "t1",
            "data": { "id": "x", "name": "t1_x", "author": null, "body": "[deleted]", "parent_id": "t3_abc", "replies": "" }
        });
        let things = parse_things(vec![serde_json::from_value(raw).unwrap()]).unwrap();
        let collector = collect(things);
        assert_eq!(collector.comments[0].author, None);
        assert_eq!(collector.comments[0].depth, 0);
    }
}
