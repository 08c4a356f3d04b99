//! Scripted transport for worker tests

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use herald_common::{ChatId, SourceRef};
use herald_delivery::{DeliveryError, PermanentError, SystemError, TemporaryError, Transport};

/// Scripted result of one delivery to a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Ok,
    Permanent,
    Transient,
    RateLimited(u64),
    Unknown,
    System,
}

impl Step {
    fn into_result(self) -> Result<(), DeliveryError> {
        match self {
            Self::Ok => Ok(()),
            Self::Permanent => Err(PermanentError::Forbidden("no rights".to_string()).into()),
            Self::Transient => {
                Err(TemporaryError::ConnectionFailed("connection reset".to_string()).into())
            }
            Self::RateLimited(secs) => Err(TemporaryError::RateLimited {
                retry_after: Duration::from_secs(secs),
            }
            .into()),
            Self::Unknown => Err(DeliveryError::Unknown("unexpected reply".to_string())),
            Self::System => Err(SystemError::Internal("client state lost".to_string()).into()),
        }
    }
}

/// A call observed by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Copy { chat_id: ChatId, text: String },
    Forward { chat_id: ChatId, source: SourceRef },
    Notice { chat_id: ChatId, text: String },
}

#[derive(Debug, Default)]
struct State {
    scripts: HashMap<ChatId, VecDeque<Step>>,
    unresolvable: HashSet<ChatId>,
    fail_notices: bool,
    resolves: usize,
    calls: Vec<Call>,
}

/// Transport whose delivery results are scripted per chat.
///
/// A chat with no remaining script steps accepts everything.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue up results for successive deliveries to `chat_id`
    pub fn script(&self, chat_id: ChatId, steps: &[Step]) -> &Self {
        self.state
            .lock()
            .unwrap()
            .scripts
            .entry(chat_id)
            .or_default()
            .extend(steps.iter().copied());
        self
    }

    /// Make resolving `chat_id` fail permanently
    pub fn unresolvable(&self, chat_id: ChatId) -> &Self {
        self.state.lock().unwrap().unresolvable.insert(chat_id);
        self
    }

    pub fn fail_notices(&self) -> &Self {
        self.state.lock().unwrap().fail_notices = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Chats that received a copy or forward, in call order
    pub fn deliveries(&self) -> Vec<ChatId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Copy { chat_id, .. } | Call::Forward { chat_id, .. } => Some(chat_id),
                Call::Notice { .. } => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<(ChatId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Notice { chat_id, text } => Some((chat_id, text)),
                _ => None,
            })
            .collect()
    }

    /// Every call into the transport, including resolves
    pub fn total_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.resolves + state.calls.len()
    }

    fn next_step(&self, chat_id: ChatId) -> Step {
        self.state
            .lock()
            .unwrap()
            .scripts
            .get_mut(&chat_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Step::Ok)
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Peer = ChatId;

    async fn resolve(&self, chat_id: ChatId) -> Result<Self::Peer, DeliveryError> {
        let mut state = self.state.lock().unwrap();
        state.resolves += 1;
        if state.unresolvable.contains(&chat_id) {
            return Err(PermanentError::Unresolvable(chat_id).into());
        }
        Ok(chat_id)
    }

    async fn deliver_copy(&self, peer: &Self::Peer, text: &str) -> Result<(), DeliveryError> {
        self.state.lock().unwrap().calls.push(Call::Copy {
            chat_id: *peer,
            text: text.to_string(),
        });
        self.next_step(*peer).into_result()
    }

    async fn deliver_forward(
        &self,
        peer: &Self::Peer,
        source: SourceRef,
    ) -> Result<(), DeliveryError> {
        self.state.lock().unwrap().calls.push(Call::Forward {
            chat_id: *peer,
            source,
        });
        self.next_step(*peer).into_result()
    }

    async fn send_notice(&self, peer: &Self::Peer, text: &str) -> Result<(), DeliveryError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Notice {
            chat_id: *peer,
            text: text.to_string(),
        });
        if state.fail_notices {
            return Err(DeliveryError::Unknown("notice refused".to_string()));
        }
        Ok(())
    }
}
