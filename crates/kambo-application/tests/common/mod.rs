//! Fake collaborators shared by the pipeline integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use kambo_core::config::AppConfig;
use kambo_core::error::{KamboError, Result as KamboResult};
use kambo_core::generation::{GenerationError, TextGenerator};
use kambo_core::moderation::{ContentModerator, ModerationOutcome};
use kambo_core::repository::{InteractionRecord, InteractionRecorder, SecurityEvent};
use kambo_core::retrieval::ContextRetriever;
use kambo_application::Orchestrator;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Which stage a prompt belongs to, recognised from the template wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Topic,
    Draft,
    Verify,
}

impl Role {
    fn of(prompt: &str) -> Self {
        if prompt.starts_with("You are a content classifier") {
            Role::Topic
        } else if prompt.starts_with("You are a medical compliance reviewer") {
            Role::Verify
        } else {
            Role::Draft
        }
    }
}

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(GenerationError),
    Sleep(Duration, String),
    Panic,
}

pub fn text(s: &str) -> Reply {
    Reply::Text(s.to_string())
}

/// Generator answering from per-role scripts; the last reply of a script repeats.
#[derive(Default)]
pub struct ScriptedGenerator {
    scripts: Mutex<HashMap<Role, Vec<Reply>>>,
    calls: Mutex<Vec<(Role, String)>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
            .script(Role::Topic, vec![text("YES")])
            .script(Role::Draft, vec![text("Kambo is a traditional Amazonian ceremony.")])
            .script(Role::Verify, vec![text("SAFE")])
    }

    pub fn script(self, role: Role, replies: Vec<Reply>) -> Self {
        assert!(!replies.is_empty(), "a script needs at least one reply");
        self.scripts.lock().unwrap().insert(role, replies);
        self
    }

    pub fn calls(&self, role: Role) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_reply(&self, role: Role) -> Reply {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.get_mut(&role).expect("role is scripted");
        if script.len() > 1 {
            script.remove(0)
        } else {
            script[0].clone()
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate_text(&self, prompt: &str, _temperature: f32) -> Result<String, GenerationError> {
        let role = Role::of(prompt);
        self.calls.lock().unwrap().push((role, prompt.to_string()));

        match self.next_reply(role) {
            Reply::Text(text) => Ok(text),
            Reply::Fail(err) => Err(err),
            Reply::Sleep(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Reply::Panic => panic!("scripted generator panic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Interaction(InteractionRecord),
    Security(SecurityEvent),
}

/// Recorder forwarding everything it receives to a channel.
pub struct ChannelRecorder {
    tx: UnboundedSender<Recorded>,
}

pub fn channel_recorder() -> (Arc<ChannelRecorder>, UnboundedReceiver<Recorded>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(ChannelRecorder { tx }), rx)
}

#[async_trait]
impl InteractionRecorder for ChannelRecorder {
    async fn record_interaction(&self, record: InteractionRecord) -> KamboResult<()> {
        let _ = self.tx.send(Recorded::Interaction(record));
        Ok(())
    }

    async fn record_security_event(&self, event: SecurityEvent) -> KamboResult<()> {
        let _ = self.tx.send(Recorded::Security(event));
        Ok(())
    }
}

/// Waits briefly for the next background write.
pub async fn next_recorded(rx: &mut UnboundedReceiver<Recorded>) -> Option<Recorded> {
    tokio::time::timeout(Duration::from_millis(500), rx.recv())
        .await
        .ok()
        .flatten()
}

/// Recorder whose every call fails.
pub struct FailingRecorder;

#[async_trait]
impl InteractionRecorder for FailingRecorder {
    async fn record_interaction(&self, _record: InteractionRecord) -> KamboResult<()> {
        Err(KamboError::data_access("disk full"))
    }

    async fn record_security_event(&self, _event: SecurityEvent) -> KamboResult<()> {
        Err(KamboError::data_access("disk full"))
    }
}

/// Recorder that panics inside the background task.
pub struct PanickingRecorder;

#[async_trait]
impl InteractionRecorder for PanickingRecorder {
    async fn record_interaction(&self, _record: InteractionRecord) -> KamboResult<()> {
        panic!("recorder exploded")
    }

    async fn record_security_event(&self, _event: SecurityEvent) -> KamboResult<()> {
        panic!("recorder exploded")
    }
}

/// Moderation service that is down.
pub struct FailingModerator;

#[async_trait]
impl ContentModerator for FailingModerator {
    async fn moderate(&self, _cleaned_text: &str) -> Result<ModerationOutcome, String> {
        Err("service down".to_string())
    }
}

/// Moderation service that answers long after the collaborator timeout.
pub struct SlowModerator;

#[async_trait]
impl ContentModerator for SlowModerator {
    async fn moderate(&self, _cleaned_text: &str) -> Result<ModerationOutcome, String> {
        tokio::time::sleep(Duration::from_secs(120)).await;
        Ok(ModerationOutcome::passed())
    }
}

/// Knowledge base returning one canned passage.
pub struct FixedRetriever(pub &'static str);

#[async_trait]
impl ContextRetriever for FixedRetriever {
    async fn retrieve_context(&self, _question: &str) -> Result<String, String> {
        Ok(self.0.to_string())
    }
}

pub struct FailingRetriever;

#[async_trait]
impl ContextRetriever for FailingRetriever {
    async fn retrieve_context(&self, _question: &str) -> Result<String, String> {
        Err("index unavailable".to_string())
    }
}

pub struct SlowRetriever;

#[async_trait]
impl ContextRetriever for SlowRetriever {
    async fn retrieve_context(&self, _question: &str) -> Result<String, String> {
        tokio::time::sleep(Duration::from_secs(120)).await;
        Ok("too late".to_string())
    }
}

pub fn orchestrator(
    generator: &Arc<ScriptedGenerator>,
    recorder: Arc<dyn InteractionRecorder>,
) -> Orchestrator {
    Orchestrator::new(&AppConfig::default(), generator.clone(), recorder)
        .expect("orchestrator builds")
}
