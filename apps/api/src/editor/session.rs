//! Inline edit sessions: one live document bound to one template.
//!
//! The session is the single entry point for mutations. Every applied change
//! bumps the revision and publishes a [`Snapshot`] to subscribers, so previews
//! always observe the latest committed document.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{watch, Mutex, MutexGuard, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::editor::path::EditPath;
use crate::editor::tree::{self, Change};
use crate::models::document::{normalize_document, ResumeData, SectionType};
use crate::render::style::StyleOptions;
use crate::sections::SectionManager;

/// A committed state of the document.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub revision: u64,
    pub document: Arc<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EditOutcome {
    Applied {
        revision: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        item_id: Option<String>,
    },
    Unchanged,
    /// The edit was dropped. Callers treat this as a no-op.
    Ignored { reason: String },
}

impl EditOutcome {
    fn ignored(reason: impl Into<String>) -> Self {
        EditOutcome::Ignored {
            reason: reason.into(),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied { .. })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldEdit {
    pub path: String,
    pub value: Value,
}

pub struct EditSession {
    id: Uuid,
    user_id: Uuid,
    template_id: String,
    resume_id: Option<Uuid>,
    editable: bool,
    document: Arc<Value>,
    style: StyleOptions,
    revision: u64,
    notifier: watch::Sender<Snapshot>,
}

impl EditSession {
    pub fn new(user_id: Uuid, template_id: impl Into<String>, document: Value, editable: bool) -> Self {
        let document = Arc::new(normalize_document(document));
        let (notifier, _) = watch::channel(Snapshot {
            revision: 0,
            document: Arc::clone(&document),
        });

        EditSession {
            id: Uuid::new_v4(),
            user_id,
            template_id: template_id.into(),
            resume_id: None,
            editable,
            document,
            style: StyleOptions::default(),
            revision: 0,
            notifier,
        }
    }

    pub fn with_resume_id(mut self, resume_id: Uuid) -> Self {
        self.resume_id = Some(resume_id);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub fn resume_id(&self) -> Option<Uuid> {
        self.resume_id
    }

    /// Binds the session to a persisted resume after its first save.
    pub fn set_resume_id(&mut self, resume_id: Uuid) {
        self.resume_id = Some(resume_id);
    }

    pub fn editable(&self) -> bool {
        self.editable
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn document(&self) -> &Arc<Value> {
        &self.document
    }

    /// Typed view of the current document.
    pub fn data(&self) -> ResumeData {
        ResumeData::from_value_lossy(&self.document)
    }

    pub fn style(&self) -> &StyleOptions {
        &self.style
    }

    /// Replaces the presentation overrides. Counts as a change so previews re-render.
    pub fn set_style(&mut self, style: StyleOptions) -> EditOutcome {
        if !self.editable {
            return EditOutcome::ignored("session is read-only");
        }
        if self.style == style {
            return EditOutcome::Unchanged;
        }
        self.style = style;
        self.commit(None)
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.notifier.subscribe()
    }

    /// Sets the value at `path`. Malformed paths and rejected edits are ignored.
    pub fn update_field(&mut self, path: &str, value: Value) -> EditOutcome {
        if !self.editable {
            return EditOutcome::ignored("session is read-only");
        }

        let path = match EditPath::parse(path) {
            Ok(path) => path,
            Err(e) => {
                debug!("Ignoring edit on session {}: {e}", self.id);
                return EditOutcome::ignored(e.to_string());
            }
        };

        if tree::lookup(&self.document, path.segments()) == Some(&value) {
            return EditOutcome::Unchanged;
        }

        match tree::assign(Arc::make_mut(&mut self.document), path.segments(), value) {
            Ok(Change::Applied) => self.commit(None),
            Ok(Change::Unchanged) => EditOutcome::Unchanged,
            Err(e) => {
                debug!("Rejected edit '{path}' on session {}: {e}", self.id);
                EditOutcome::ignored(e.to_string())
            }
        }
    }

    /// Applies edits strictly in the order given.
    pub fn apply_batch(&mut self, edits: Vec<FieldEdit>) -> Vec<EditOutcome> {
        edits
            .into_iter()
            .map(|edit| self.update_field(&edit.path, edit.value))
            .collect()
    }

    /// Appends `item` to the list at `path`; object items get an id when missing.
    pub fn add_item(&mut self, path: &str, item: Value) -> EditOutcome {
        if !self.editable {
            return EditOutcome::ignored("session is read-only");
        }
        let path = match EditPath::parse(path) {
            Ok(path) => path,
            Err(e) => return EditOutcome::ignored(e.to_string()),
        };

        match tree::push_item(Arc::make_mut(&mut self.document), path.segments(), item) {
            Ok(id) => self.commit(Some(id).filter(|id| !id.is_empty())),
            Err(e) => {
                debug!("Rejected add on '{path}' for session {}: {e}", self.id);
                EditOutcome::ignored(e.to_string())
            }
        }
    }

    pub fn remove_item(&mut self, path: &str, id: &str) -> EditOutcome {
        if !self.editable {
            return EditOutcome::ignored("session is read-only");
        }
        let path = match EditPath::parse(path) {
            Ok(path) => path,
            Err(e) => return EditOutcome::ignored(e.to_string()),
        };

        match tree::remove_item(Arc::make_mut(&mut self.document), path.segments(), id) {
            Ok(_) => self.commit(None),
            Err(e) => {
                debug!("Rejected remove on '{path}' for session {}: {e}", self.id);
                EditOutcome::ignored(e.to_string())
            }
        }
    }

    /// Removes the entry at `index` of the list at `path`, for lists of plain
    /// strings (bullets, stats, grouped entries) that carry no ids.
    pub fn remove_at(&mut self, path: &str, index: usize) -> EditOutcome {
        if !self.editable {
            return EditOutcome::ignored("session is read-only");
        }
        let path = match EditPath::parse(path) {
            Ok(path) => path,
            Err(e) => return EditOutcome::ignored(e.to_string()),
        };

        match tree::remove_at(Arc::make_mut(&mut self.document), path.segments(), index) {
            Ok(_) => self.commit(None),
            Err(e) => {
                debug!("Rejected remove of '{path}.{index}' for session {}: {e}", self.id);
                EditOutcome::ignored(e.to_string())
            }
        }
    }

    pub fn add_section(&mut self, section_type: SectionType, variant: Option<&str>) -> EditOutcome {
        let mut new_id = None;
        let outcome = self.with_sections(|manager| {
            new_id = Some(manager.add_section(section_type, variant).id);
            true
        });
        match outcome {
            EditOutcome::Applied { revision, .. } => EditOutcome::Applied {
                revision,
                item_id: new_id,
            },
            other => other,
        }
    }

    pub fn reorder_sections(&mut self, active_id: &str, over_id: Option<&str>) -> EditOutcome {
        self.with_sections(|manager| manager.reorder(active_id, over_id))
    }

    pub fn delete_section(&mut self, id: &str) -> EditOutcome {
        self.with_sections(|manager| manager.delete_section(id))
    }

    pub fn set_section_enabled(&mut self, id: &str, enabled: bool) -> EditOutcome {
        self.with_sections(|manager| manager.set_enabled(id, enabled))
    }

    pub fn rename_section(&mut self, id: &str, title: &str) -> EditOutcome {
        self.with_sections(|manager| manager.rename(id, title))
    }

    /// Forks a session bound to another template. The document is shared, not
    /// copied or transformed.
    pub fn switch_template(&self, template_id: impl Into<String>) -> EditSession {
        let (notifier, _) = watch::channel(Snapshot {
            revision: self.revision,
            document: Arc::clone(&self.document),
        });

        EditSession {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            template_id: template_id.into(),
            resume_id: self.resume_id,
            editable: self.editable,
            document: Arc::clone(&self.document),
            style: self.style.clone(),
            revision: self.revision,
            notifier,
        }
    }

    fn with_sections(&mut self, op: impl FnOnce(&mut SectionManager) -> bool) -> EditOutcome {
        if !self.editable {
            return EditOutcome::ignored("session is read-only");
        }

        let Some(sections) = self.document.get("sections").and_then(Value::as_array) else {
            return EditOutcome::ignored("sections is not a list");
        };
        let mut manager = SectionManager::new(sections.clone());
        if !op(&mut manager) {
            return EditOutcome::Unchanged;
        }

        if let Value::Object(map) = Arc::make_mut(&mut self.document) {
            map.insert("sections".to_string(), Value::Array(manager.into_sections()));
        }
        self.commit(None)
    }

    fn commit(&mut self, item_id: Option<String>) -> EditOutcome {
        self.revision += 1;
        self.notifier.send_replace(Snapshot {
            revision: self.revision,
            document: Arc::clone(&self.document),
        });
        EditOutcome::Applied {
            revision: self.revision,
            item_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Save,
    Export,
}

/// A registered session plus its per-action in-flight flags.
pub struct SessionHandle {
    pub session: Mutex<EditSession>,
    saving: AtomicBool,
    exporting: AtomicBool,
    /// Held across the store writes of save and export.
    persisting: Mutex<()>,
    touched: std::sync::Mutex<Instant>,
}

/// Held while an action runs; releases the flag on drop.
pub struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl SessionHandle {
    fn new(session: EditSession) -> Self {
        SessionHandle {
            session: Mutex::new(session),
            saving: AtomicBool::new(false),
            exporting: AtomicBool::new(false),
            persisting: Mutex::new(()),
            touched: std::sync::Mutex::new(Instant::now()),
        }
    }

    pub async fn persist_lock(&self) -> MutexGuard<'_, ()> {
        self.persisting.lock().await
    }

    fn touch(&self) {
        *self.touched.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.touched.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn busy(&self) -> bool {
        self.saving.load(Ordering::Acquire) || self.exporting.load(Ordering::Acquire)
    }

    /// Marks `action` as running. Returns `None` when it already is.
    pub fn begin(&self, action: Action) -> Option<InFlight<'_>> {
        let flag = match action {
            Action::Save => &self.saving,
            Action::Export => &self.exporting,
        };
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight { flag })
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(&self, session: EditSession) -> Arc<SessionHandle> {
        let id = session.id();
        let template_id = session.template_id().to_string();
        let handle = Arc::new(SessionHandle::new(session));
        self.sessions.write().await.insert(id, Arc::clone(&handle));
        info!("Opened edit session {id} (template: {template_id})");
        handle
    }

    /// Looks up a session and marks it as recently used.
    pub async fn get(&self, id: Uuid) -> Option<Arc<SessionHandle>> {
        let handle = self.sessions.read().await.get(&id).cloned()?;
        handle.touch();
        Some(handle)
    }

    pub async fn close(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!("Closed edit session {id}");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions untouched for at least `max_idle`. Sessions with a save or
    /// export in flight are kept.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, handle| {
            let keep = handle.busy() || handle.idle_for(now) < max_idle;
            if !keep {
                info!("Evicted idle edit session {id}");
            }
            keep
        });
        before - sessions.len()
    }

    /// Sweeps idle sessions in the background until the returned task is aborted.
    pub fn spawn_eviction(self: Arc<Self>, max_idle: Duration) -> JoinHandle<()> {
        let period = max_idle.clamp(Duration::from_secs(1), Duration::from_secs(60));
        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = self.evict_idle(max_idle).await;
                if evicted > 0 {
                    debug!("Idle sweep evicted {evicted} session(s)");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> EditSession {
        EditSession::new(
            Uuid::new_v4(),
            "modern-professional",
            json!({
                "personalInfo": { "fullName": "Ada Lovelace" },
                "volunteer": [{ "id": "v1", "role": "Tutor", "organization": "Red Cross" }]
            }),
            true,
        )
    }

    #[test]
    fn test_update_field_twice_equals_once() {
        let mut session = session();
        let first = session.update_field("volunteer.0.role", json!("Mentor"));
        assert_eq!(
            first,
            EditOutcome::Applied {
                revision: 1,
                item_id: None
            }
        );
        let once = (*session.document().clone()).clone();

        assert_eq!(session.update_field("volunteer.0.role", json!("Mentor")), EditOutcome::Unchanged);
        assert_eq!(**session.document(), once);
        assert_eq!(session.revision(), 1);
    }

    #[test]
    fn test_malformed_path_is_ignored() {
        let mut session = session();
        let before = session.document().clone();
        assert!(matches!(
            session.update_field("personalInfo..fullName", json!("x")),
            EditOutcome::Ignored { .. }
        ));
        assert!(matches!(
            session.update_field("volunteer.7.role", json!("x")),
            EditOutcome::Ignored { .. }
        ));
        assert_eq!(session.document(), &before);
        assert_eq!(session.revision(), 0);
    }

    #[test]
    fn test_read_only_session_ignores_mutations() {
        let mut session = EditSession::new(Uuid::new_v4(), "classic", json!({}), false);
        assert!(!session.update_field("personalInfo.fullName", json!("Ada")).is_applied());
        assert!(!session.add_item("skills", json!({ "name": "Rust" })).is_applied());
        assert!(!session.add_section(SectionType::Summary, None).is_applied());
        assert_eq!(session.data().personal_info.full_name, "");
    }

    #[test]
    fn test_batch_applies_in_order() {
        let mut session = session();
        let outcomes = session.apply_batch(vec![
            FieldEdit {
                path: "skills.0.name".into(),
                value: json!("Rust"),
            },
            FieldEdit {
                path: "skills.0.name".into(),
                value: json!("Go"),
            },
        ]);
        assert!(outcomes.iter().all(EditOutcome::is_applied));
        assert_eq!(session.data().skills[0].name, "Go");
    }

    #[test]
    fn test_add_and_remove_item() {
        let mut session = session();
        let EditOutcome::Applied {
            item_id: Some(id), ..
        } = session.add_item("volunteer", json!({ "role": "Coach" }))
        else {
            panic!("expected item id");
        };
        assert_eq!(session.data().volunteer.len(), 2);

        assert!(session.remove_item("volunteer", &id).is_applied());
        assert!(!session.remove_item("volunteer", &id).is_applied());
        assert_eq!(session.data().volunteer.len(), 1);
    }

    #[test]
    fn test_section_operations_write_back() {
        let mut session = session();
        let EditOutcome::Applied {
            item_id: Some(skills_id),
            ..
        } = session.add_section(SectionType::Skills, None)
        else {
            panic!("expected section id");
        };
        session.add_section(SectionType::Summary, None);
        assert!(session.delete_section(&skills_id).is_applied());

        let sections = session.data().sections;
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section_type, SectionType::Summary);
        assert_eq!(sections[0].order, 0);

        let id = sections[0].id.clone();
        assert_eq!(session.reorder_sections(&id, None), EditOutcome::Unchanged);
        assert!(session.set_section_enabled(&id, false).is_applied());
        assert!(!session.data().sections[0].enabled);
    }

    #[test]
    fn test_wrongly_typed_section_leaf_survives_section_changes() {
        let mut session = EditSession::new(
            Uuid::new_v4(),
            "classic",
            json!({
                "sections": [{
                    "id": "keep-me", "type": "custom", "order": 0, "enabled": true,
                    "title": "Notes", "data": { "content": "hello" }
                }]
            }),
            true,
        );
        assert!(session.update_field("sections.0.title", json!(2024)).is_applied());
        assert!(session.add_section(SectionType::Summary, None).is_applied());

        let sections = &session.document()["sections"];
        assert_eq!(sections[0]["id"], "keep-me");
        assert_eq!(sections[0]["title"], 2024);
        assert_eq!(sections[0]["data"]["content"], "hello");
        assert_eq!(sections[1]["order"], 1);
    }

    #[test]
    fn test_section_ops_on_non_list_are_ignored() {
        let mut session = session();
        session.update_field("sections", json!("oops"));
        assert!(matches!(
            session.add_section(SectionType::Summary, None),
            EditOutcome::Ignored { .. }
        ));
        assert_eq!(session.document()["sections"], "oops");
    }

    #[test]
    fn test_remove_at_drops_plain_entries() {
        let mut session = session();
        session.update_field("volunteer.0.highlights", json!(["Ran a club", "Taught maths"]));
        assert!(session.remove_at("volunteer.0.highlights", 0).is_applied());
        assert_eq!(session.document()["volunteer"][0]["highlights"], json!(["Taught maths"]));

        let revision = session.revision();
        assert!(!session.remove_at("volunteer.0.highlights", 5).is_applied());
        assert!(!session.remove_at("volunteer..highlights", 0).is_applied());
        assert_eq!(session.revision(), revision);
    }

    #[test]
    fn test_style_changes_commit_and_fork() {
        let mut session = session();
        let style = StyleOptions {
            show_skills: false,
            ..Default::default()
        };
        assert!(session.set_style(style.clone()).is_applied());
        assert_eq!(session.set_style(style.clone()), EditOutcome::Unchanged);
        assert_eq!(session.revision(), 1);
        assert_eq!(session.switch_template("minimal").style(), &style);

        let mut read_only = EditSession::new(Uuid::new_v4(), "classic", json!({}), false);
        assert!(!read_only.set_style(style).is_applied());
        assert_eq!(read_only.style(), &StyleOptions::default());
    }

    #[test]
    fn test_switch_template_keeps_data() {
        let session = session();
        let forked = session.switch_template("creative-bold");
        assert_eq!(forked.template_id(), "creative-bold");
        assert_eq!(session.template_id(), "modern-professional");
        assert_ne!(forked.id(), session.id());
        assert_eq!(forked.data(), session.data());
    }

    #[test]
    fn test_fork_edits_do_not_leak_back() {
        let session = session();
        let mut forked = session.switch_template("minimal");
        forked.update_field("personalInfo.fullName", json!("Grace Hopper"));
        assert_eq!(session.data().personal_info.full_name, "Ada Lovelace");
        assert_eq!(forked.data().personal_info.full_name, "Grace Hopper");
    }

    #[tokio::test]
    async fn test_subscribers_see_latest_snapshot() {
        let mut session = session();
        let mut rx = session.subscribe();
        session.update_field("personalInfo.title", json!("Engineer"));
        rx.changed().await.unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.document["personalInfo"]["title"], "Engineer");
    }

    #[tokio::test]
    async fn test_registry_in_flight_guard() {
        let registry = SessionRegistry::new();
        let handle = registry.open(session()).await;
        let id = handle.session.lock().await.id();
        assert!(registry.get(id).await.is_some());

        let guard = handle.begin(Action::Save).expect("first save starts");
        assert!(handle.begin(Action::Save).is_none());
        assert!(handle.begin(Action::Export).is_some());
        drop(guard);
        assert!(handle.begin(Action::Save).is_some());

        assert!(registry.close(id).await);
        assert!(registry.get(id).await.is_none());
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_evicted() {
        let registry = SessionRegistry::new();
        let active = registry.open(session()).await.session.lock().await.id();
        let idle = registry.open(session()).await.session.lock().await.id();
        let busy = registry.open(session()).await;
        let _saving = busy.begin(Action::Save);

        time::advance(Duration::from_secs(20 * 60)).await;
        assert!(registry.get(active).await.is_some());
        time::advance(Duration::from_secs(15 * 60)).await;

        assert_eq!(registry.evict_idle(Duration::from_secs(30 * 60)).await, 1);
        assert!(registry.get(idle).await.is_none());
        assert!(registry.get(active).await.is_some());
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweep_evicts() {
        let registry = Arc::new(SessionRegistry::new());
        registry.open(session()).await;
        let sweeper = Arc::clone(&registry).spawn_eviction(Duration::from_secs(120));

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(registry.len().await, 1);
        time::sleep(Duration::from_secs(125)).await;
        assert_eq!(registry.len().await, 0);
        sweeper.abort();
    }
}
