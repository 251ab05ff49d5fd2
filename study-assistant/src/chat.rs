// Chat screen state machine.
//
// Idle -> AwaitingFirstReply -> Answering -> AwaitingEvaluation -> Evaluated
// Evaluated -> AwaitingNewQuestion -> Answering
// any -> Idle (shift subject)
//
// The first message of a session names the topic and is sent to the question
// generator. Every later message is an answer to the current question.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::{ApiError, Evaluation};
use crate::config::ChatConfig;
use crate::protocol::InputEdit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// One message in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub speaker: Speaker,
    /// May contain `<br/>` breaks and `$$` formula markup.
    pub text: String,
    /// Marks assistant turns that report a failed request.
    pub is_error: bool,
    pub at: DateTime<Utc>,
}

impl ChatTurn {
    fn user(text: &str) -> Self {
        ChatTurn {
            speaker: Speaker::User,
            text: text.to_string(),
            is_error: false,
            at: Utc::now(),
        }
    }

    fn assistant(text: String) -> Self {
        ChatTurn {
            speaker: Speaker::Assistant,
            text,
            is_error: false,
            at: Utc::now(),
        }
    }

    fn error(text: String) -> Self {
        ChatTurn {
            is_error: true,
            ..ChatTurn::assistant(text)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    AwaitingFirstReply,
    Answering,
    AwaitingEvaluation,
    Evaluated,
    AwaitingNewQuestion,
}

impl ChatPhase {
    pub fn is_waiting(self) -> bool {
        matches!(
            self,
            ChatPhase::AwaitingFirstReply
                | ChatPhase::AwaitingEvaluation
                | ChatPhase::AwaitingNewQuestion
        )
    }
}

/// Verdict shown under an evaluated answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Wrong,
    /// No score was available; nothing is claimed about the answer.
    Unscored,
}

/// Network work the chat screen asks the app to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRequest {
    GenerateQuestion { topic: String },
    Evaluate { question: String, answer: String },
}

/// Successful result of a `ChatRequest`.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    Question(String),
    Evaluation(Evaluation),
}

/// State of the chat screen.
#[derive(Debug, Clone)]
pub struct ChatState {
    transcript: Vec<ChatTurn>,
    /// Text being typed in the input box.
    pub input: String,
    phase: ChatPhase,
    topic: Option<String>,
    current_question: Option<String>,
    feedback: Option<Feedback>,
    last_score: Option<f64>,
    hint: Option<String>,
    /// Identifies the latest request. Bumped on every request and on shift.
    generation: u64,
    pass_mark: f64,
}

impl ChatState {
    pub fn new(config: &ChatConfig) -> Self {
        ChatState {
            transcript: Vec::new(),
            input: String::new(),
            phase: ChatPhase::Idle,
            topic: None,
            current_question: None,
            feedback: None,
            last_score: None,
            hint: None,
            generation: 0,
            pass_mark: config.pass_mark,
        }
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn current_question(&self) -> Option<&str> {
        self.current_question.as_deref()
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback
    }

    pub fn last_score(&self) -> Option<f64> {
        self.last_score
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Whether a request is outstanding (send and new-question disabled).
    pub fn is_waiting(&self) -> bool {
        self.phase.is_waiting()
    }

    pub fn can_request_new_question(&self) -> bool {
        self.phase == ChatPhase::Evaluated
    }

    pub fn edit_input(&mut self, edit: &InputEdit) {
        edit.apply(&mut self.input);
    }

    /// Send whatever is in the input box. The box is cleared only when the
    /// message was accepted.
    pub fn send_input(&mut self) -> Option<(u64, ChatRequest)> {
        let text = self.input.clone();
        let request = self.send_message(&text)?;
        self.input.clear();
        Some(request)
    }

    /// Append a user turn and return the request it triggers.
    ///
    /// No-op for blank text or while a request is outstanding.
    pub fn send_message(&mut self, text: &str) -> Option<(u64, ChatRequest)> {
        let trimmed = text.trim();
        if trimmed.is_empty() || self.is_waiting() {
            return None;
        }

        self.transcript.push(ChatTurn::user(text));
        self.feedback = None;

        let request = match (self.phase, self.current_question.clone()) {
            (ChatPhase::Answering | ChatPhase::Evaluated, Some(question)) => {
                self.phase = ChatPhase::AwaitingEvaluation;
                ChatRequest::Evaluate {
                    question,
                    answer: trimmed.to_string(),
                }
            }
            _ => {
                self.topic = Some(trimmed.to_string());
                self.phase = ChatPhase::AwaitingFirstReply;
                ChatRequest::GenerateQuestion {
                    topic: trimmed.to_string(),
                }
            }
        };

        self.generation += 1;
        debug!("Chat request {:?} (gen: {})", request, self.generation);
        Some((self.generation, request))
    }

    /// Ask for another question on the same topic. Only valid once the
    /// latest answer has been evaluated.
    pub fn request_new_question(&mut self) -> Option<(u64, ChatRequest)> {
        if !self.can_request_new_question() {
            return None;
        }
        let topic = self.topic.clone()?;
        self.phase = ChatPhase::AwaitingNewQuestion;
        self.feedback = None;
        self.generation += 1;
        info!("Requesting new question on {} (gen: {})", topic, self.generation);
        Some((self.generation, ChatRequest::GenerateQuestion { topic }))
    }

    /// Drop the conversation and return to topic selection. Any outstanding
    /// reply will be discarded.
    pub fn shift_subject(&mut self) {
        self.transcript.clear();
        self.input.clear();
        self.phase = ChatPhase::Idle;
        self.topic = None;
        self.current_question = None;
        self.feedback = None;
        self.last_score = None;
        self.hint = None;
        self.generation += 1;
        info!("Shifted subject (gen: {})", self.generation);
    }

    /// Show the hint panel for the most recent question. Returns `false` when
    /// there is no question yet. The transcript is not touched.
    pub fn show_hint(&mut self) -> bool {
        match self.current_question.as_deref() {
            Some(question) => {
                self.hint = Some(compose_hint(question));
                true
            }
            None => false,
        }
    }

    pub fn hide_hint(&mut self) {
        self.hint = None;
    }

    /// Apply the outcome of the request issued with `generation`. Returns
    /// whether it was applied; stale replies are dropped. A reply of the
    /// wrong kind for the current phase counts as a failed request.
    pub fn apply_reply(&mut self, generation: u64, result: Result<ChatReply, ApiError>) -> bool {
        if generation != self.generation || !self.is_waiting() {
            debug!(
                "Discarding stale chat reply (reply gen: {}, current gen: {})",
                generation, self.generation
            );
            return false;
        }

        match result {
            Ok(ChatReply::Question(question))
                if matches!(
                    self.phase,
                    ChatPhase::AwaitingFirstReply | ChatPhase::AwaitingNewQuestion
                ) =>
            {
                self.transcript.push(ChatTurn::assistant(question.clone()));
                self.current_question = Some(question);
                self.hint = None;
                self.phase = ChatPhase::Answering;
            }
            Ok(ChatReply::Evaluation(evaluation)) if self.phase == ChatPhase::AwaitingEvaluation => {
                self.feedback = Some(match evaluation.score {
                    Some(score) if score >= self.pass_mark => Feedback::Correct,
                    Some(_) => Feedback::Wrong,
                    None => Feedback::Unscored,
                });
                self.last_score = evaluation.score;
                self.transcript
                    .push(ChatTurn::assistant(describe_evaluation(&evaluation)));
                self.phase = ChatPhase::Evaluated;
            }
            Ok(reply) => {
                warn!("Reply {:?} does not fit phase {:?}", reply, self.phase);
                self.fail(&ApiError::InvalidResponse(format!(
                    "reply does not fit {:?}",
                    self.phase
                )));
            }
            Err(e) => self.fail(&e),
        }
        true
    }

    /// Record a failed request as an error turn and fall back to the phase
    /// the request was made from.
    fn fail(&mut self, e: &ApiError) {
        warn!("Chat request failed in {:?}: {}", self.phase, e);
        let (message, next) = match self.phase {
            ChatPhase::AwaitingFirstReply => {
                self.topic = None;
                ("Failed to get response.", ChatPhase::Idle)
            }
            ChatPhase::AwaitingEvaluation => {
                ("Failed to evaluate your answer.", ChatPhase::Answering)
            }
            _ => ("Failed to get new question.", ChatPhase::Evaluated),
        };
        self.transcript.push(ChatTurn::error(format!(
            "Error: {} {}",
            message,
            e.user_message()
        )));
        self.phase = next;
    }
}

/// Explanatory text for the hint panel.
pub fn compose_hint(question: &str) -> String {
    format!(
        "Detailed explanation for:\n\n\"{}\"\n\n\
         Write down what is given and what is asked, then pick the formula \
         that links them. Substitute step by step and check your units.",
        plain_text(question).trim()
    )
}

/// Assistant text for an evaluation.
fn describe_evaluation(evaluation: &Evaluation) -> String {
    match (evaluation.score, evaluation.explanation.as_deref()) {
        (Some(score), Some(explanation)) => format!("Score: {score}/100<br/><br/>{explanation}"),
        (Some(score), None) => format!("Score: {score}/100"),
        (None, Some(explanation)) => explanation.to_string(),
        (None, None) => "Answer received.".to_string(),
    }
}

/// Render message markup for a terminal: `<br/>` becomes a newline.
pub fn plain_text(markup: &str) -> String {
    markup
        .replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("<br>", "\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
