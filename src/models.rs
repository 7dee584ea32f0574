use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/**
 * A poll question, published once its pub_date has passed
 */
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
}

impl Question {
    /**
     * Whether the question was published within the last day
     *
     * Questions dated in the future are not "recent", they are unpublished
     */
    pub fn was_published_recently(&self) -> bool {
        let now = Utc::now();
        self.pub_date <= now && self.pub_date >= (now - Duration::days(1))
    }
}

/**
 * One selectable answer to a question, carrying its running vote count
 */
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub choice_text: String,
    pub votes: i64,
}

/**
 * A question joined with the sum of its choices' votes, for the popular
 * listing
 */
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct QuestionSummary {
    pub id: i64,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub total_votes: i64,
}
