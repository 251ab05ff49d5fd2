// Offline tutor: answers every client call locally.
//
// Used when no API base URL is configured. Logins succeed only for the demo
// account; signups always succeed. Questions come from a small fixed bank
// and evaluations return a worked explanation without a score.

use async_trait::async_trait;

use super::{ApiError, AuthClient, Credentials, Evaluation, QuestionClient, SignupRequest};

pub const DEMO_USERNAME: &str = "testuser";
pub const DEMO_PASSWORD: &str = "password123";

const QUESTION_BANK: &[&str] = &[
    "Solve for x in the equation:<br/>$$\n2x^2 + 3x - 5 = 0\n$$",
    "A ball is dropped from rest. How far has it fallen after 3 seconds?<br/>$$\ny = \\frac{1}{2}gt^2\n$$",
    "Find the roots of<br/>$$\nx^2 - 5x + 6 = 0\n$$",
];

const WORKED_EXPLANATION: &str = "Here's how to approach it with the quadratic formula:<br/><br/>\
$$\nx = \\frac{-b \\pm \\sqrt{b^2 - 4ac}}{2a}\n$$<br/>\
Identify a, b and c, compute the discriminant, then take both signs.";

/// Local stand-in for every remote client.
pub struct OfflineTutor;

impl OfflineTutor {
    /// Pick a question for `topic`. The same topic always gets the same
    /// question, different topics spread over the bank.
    pub fn question_for(topic: &str) -> String {
        let index = topic
            .trim()
            .to_lowercase()
            .bytes()
            .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
            % QUESTION_BANK.len();
        format!(
            "Here's a question about {}:<br/><br/>{}",
            topic.trim(),
            QUESTION_BANK[index]
        )
    }
}

#[async_trait]
impl AuthClient for OfflineTutor {
    async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        if credentials.username == DEMO_USERNAME && credentials.password == DEMO_PASSWORD {
            Ok(format!("offline-{}", credentials.username))
        } else {
            Err(ApiError::Status {
                status: 401,
                body: format!(
                    "Invalid username or password. Try: {DEMO_USERNAME} / {DEMO_PASSWORD}"
                ),
            })
        }
    }

    async fn signup(&self, request: &SignupRequest) -> Result<String, ApiError> {
        Ok(format!("offline-{}", request.credentials.username))
    }
}

#[async_trait]
impl QuestionClient for OfflineTutor {
    async fn generate_question(&self, topic: &str) -> Result<String, ApiError> {
        Ok(Self::question_for(topic))
    }

    async fn evaluate(&self, _question: &str, _answer: &str) -> Result<Evaluation, ApiError> {
        Ok(Evaluation {
            score: None,
            explanation: Some(WORKED_EXPLANATION.to_string()),
        })
    }
}
