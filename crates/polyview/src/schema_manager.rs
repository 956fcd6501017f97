use std::sync::Arc;

use poll_promise::Promise;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::observer::{Subscribers, Subscription};
use crate::profile::{LocalEdits, ParameterKey, Profile, ProfilePath};
use crate::request::{take_ready, ParameterValue, RequestManager};
use crate::{Error, Result, Schema};

struct PendingFetch {
    generation: u64,
    first_load: bool,
    promise: Option<Promise<Result<Schema>>>,
}

enum PostKind {
    /// Full profile; acknowledges every profile edit up to `seq`.
    Profile { seq: u64, then_reload: bool },
    /// Single `/parameter/value/<id>` mutation.
    Parameter { key: ParameterKey, seq: u64 },
}

struct PendingPost {
    kind: PostKind,
    promise: Option<Promise<Result<()>>>,
}

#[derive(Debug)]
pub enum SchemaEvent {
    /// A fresh schema was merged and published to subscribers.
    Merged(Arc<Schema>),
    /// An imported profile was accepted; the viewer should start over.
    ReloadRequested,
    Failed(Error),
}

/// Owns the current schema and the profile, the only place either is
/// mutated. Server pushes are merged into the profile without losing local
/// edits the server hasn't acknowledged yet.
pub struct SchemaManager {
    schema: Option<Arc<Schema>>,
    profile: Profile,
    edits: LocalEdits,
    generation: u64,
    revision: u64,
    fetch: Option<PendingFetch>,
    refetch_queued: bool,
    posts: Vec<PendingPost>,
    subscribers: Subscribers<Arc<Schema>>,
}

impl Default for SchemaManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaManager {
    pub fn new() -> Self {
        Self {
            schema: None,
            profile: Profile::default(),
            edits: LocalEdits::default(),
            generation: 0,
            revision: 0,
            fetch: None,
            refetch_queued: false,
            posts: Vec::new(),
            subscribers: Subscribers::new(),
        }
    }

    pub fn schema(&self) -> Option<&Arc<Schema>> {
        self.schema.as_ref()
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn edits(&self) -> &LocalEdits {
        &self.edits
    }

    /// Bumped on every merge; lets views know their displayed values are stale.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch.is_some()
    }

    pub fn has_pending_posts(&self) -> bool {
        !self.posts.is_empty()
    }

    /// Listen for every freshly merged schema.
    pub fn subscribe(&mut self) -> Subscription<Arc<Schema>> {
        self.subscribers.subscribe()
    }

    /// First fetch. The profile is rebuilt from the schema's current values.
    pub fn load(&mut self, requests: &RequestManager) {
        self.issue_fetch(requests, true);
    }

    /// Fetch the schema and merge it. A refresh requested while a fetch is
    /// already in flight is issued once that one lands.
    pub fn refresh(&mut self, requests: &RequestManager) {
        if self.fetch.is_some() {
            debug!("schema fetch in flight, queueing refresh");
            self.refetch_queued = true;
            return;
        }
        self.issue_fetch(requests, false);
    }

    fn issue_fetch(&mut self, requests: &RequestManager, first_load: bool) {
        self.generation += 1;
        // nothing to merge into until a schema has landed
        let first_load = first_load || self.schema.is_none();
        self.fetch = Some(PendingFetch {
            generation: self.generation,
            first_load,
            promise: Some(requests.schema()),
        });
    }

    /// Change a profile value locally. Nothing is sent until
    /// [`SchemaManager::push_profile`].
    pub fn edit(&mut self, path: &ProfilePath, value: Value) -> Result<()> {
        self.profile.set(path, value)?;
        self.edits.record(ParameterKey::Path(path.clone()), None);
        Ok(())
    }

    /// POST the whole profile.
    pub fn push_profile(&mut self, requests: &RequestManager) {
        self.post_profile(requests, false);
    }

    fn post_profile(&mut self, requests: &RequestManager, then_reload: bool) {
        let seq = self.edits.last_seq();
        self.posts.push(PendingPost {
            kind: PostKind::Profile { seq, then_reload },
            promise: Some(requests.post_profile(&self.profile)),
        });
    }

    /// Post a single parameter mutation. Success triggers a
    /// fetch-and-merge.
    pub fn set_profile_key(&mut self, requests: &RequestManager, id: &str, value: ParameterValue) {
        let key = ParameterKey::Node(id.to_owned());
        let seq = self.edits.record(key.clone(), value.as_json().cloned());
        debug!("setting {key} (binary: {})", value.is_binary());

        self.posts.push(PendingPost {
            kind: PostKind::Parameter { key, seq },
            promise: Some(requests.set_parameter_value(id, value)),
        });
    }

    /// Swap in an imported profile and send it. Once the server takes it the
    /// viewer reloads from scratch.
    pub fn replace_profile(&mut self, requests: &RequestManager, profile: Profile) {
        info!("replacing profile");
        self.profile = profile;
        self.edits.clear();
        self.post_profile(requests, true);
    }

    /// Drive outstanding requests. Call once per frame.
    pub fn poll(&mut self, requests: &RequestManager) -> Vec<SchemaEvent> {
        let mut events = Vec::new();
        self.poll_posts(requests, &mut events);
        self.poll_fetch(requests, &mut events);
        events
    }

    fn poll_posts(&mut self, requests: &RequestManager, events: &mut Vec<SchemaEvent>) {
        let mut i = 0;
        while i < self.posts.len() {
            let Some(result) = take_ready(&mut self.posts[i].promise) else {
                i += 1;
                continue;
            };
            let post = self.posts.remove(i);

            if let Err(err) = result {
                error!("schema mutation failed: {err}");
                events.push(SchemaEvent::Failed(err));
                match &post.kind {
                    PostKind::Profile { seq, .. } => self.edits.reject_profile(*seq),
                    PostKind::Parameter { key, seq } => self.edits.reject_key(key, *seq),
                }
                // show what the server actually has
                self.refresh(requests);
                continue;
            }

            match post.kind {
                PostKind::Profile { seq, then_reload } => {
                    self.edits.acknowledge_profile(seq, self.generation);
                    if then_reload {
                        events.push(SchemaEvent::ReloadRequested);
                        continue;
                    }
                }
                PostKind::Parameter { key, seq } => {
                    self.edits.acknowledge_key(&key, seq, self.generation);
                }
            }

            self.refresh(requests);
        }
    }

    fn poll_fetch(&mut self, requests: &RequestManager, events: &mut Vec<SchemaEvent>) {
        let Some(fetch) = self.fetch.as_mut() else {
            return;
        };
        let Some(result) = take_ready(&mut fetch.promise) else {
            return;
        };
        let (generation, first_load) = (fetch.generation, fetch.first_load);
        self.fetch = None;

        match result {
            Ok(schema) => {
                let schema = self.apply(schema, generation, first_load);
                events.push(SchemaEvent::Merged(schema));
            }
            Err(err) => {
                error!("schema fetch failed: {err}");
                events.push(SchemaEvent::Failed(err));
            }
        }

        if self.refetch_queued {
            self.refetch_queued = false;
            self.issue_fetch(requests, false);
        }
    }

    fn apply(&mut self, mut schema: Schema, generation: u64, first_load: bool) -> Arc<Schema> {
        if first_load {
            self.profile = Profile::from_schema(&schema);
            self.edits.clear();
        } else {
            let merged = self.profile.merge(&schema, &mut self.edits, generation);
            self.profile = merged.profile;
        }

        let (profile, nodes) = (&self.profile, &schema.nodes);
        self.edits.retain_keys(|key| match key {
            ParameterKey::Path(path) => profile.get(path).is_some(),
            ParameterKey::Node(id) => nodes.get(id).is_some_and(|n| n.parameter.is_some()),
        });

        for (id, node) in schema.nodes.iter_mut() {
            let Some(param) = node.parameter.as_mut() else {
                continue;
            };
            let key = ParameterKey::Node(id.clone());
            if self.edits.accepts_server(&key, generation) {
                self.edits.settle(&key, generation);
            } else if let Some(local) = self.edits.pending_value(&key) {
                param.current_value = local.clone();
            }
        }

        self.revision += 1;
        debug!(
            "merged schema generation {generation} ({} producers, {} nodes)",
            schema.producers.len(),
            schema.nodes.len()
        );

        let schema = Arc::new(schema);
        self.schema = Some(schema.clone());
        self.subscribers.publish(schema.clone());
        schema
    }
}
