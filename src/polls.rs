/*!
 * The polls module contains all the queries against the questions and
 * choices tables, along with the vote recorder.
 *
 * Every listing and detail query applies the same visibility rule: a
 * question is only shown once its pub_date has passed and only if it has at
 * least one choice.
 */
use chrono::Utc;
use log::*;
use sqlx::sqlite::SqlitePool;

use crate::models::{Choice, Question, QuestionSummary};

use std::fmt;

/**
 * How many questions the index and popular pages display
 */
pub const DEFAULT_LIMIT: i64 = 5;

#[derive(Debug)]
pub enum Error {
    /// The question does not exist, or is hidden from end users.
    NotFound,
    /// The vote submission named no choice, or one the question does not own.
    NoChoice,
    Database(sqlx::Error),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("No such question."),
            Self::NoChoice => f.write_str("You didn't select a choice."),
            Self::Database(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

const VISIBLE_QUESTIONS: &str = r#"
    SELECT q.id, q.question_text, q.pub_date
    FROM questions q
    WHERE q.pub_date <= ?
      AND EXISTS (SELECT 1 FROM choices c WHERE c.question_id = q.id)
    ORDER BY q.pub_date DESC
"#;

/**
 * Return the most recently published questions, newest first
 */
pub async fn latest(db: &SqlitePool, limit: i64) -> Result<Vec<Question>> {
    let query = format!("{} LIMIT ?", VISIBLE_QUESTIONS);
    let questions = sqlx::query_as::<_, Question>(&query)
        .bind(Utc::now())
        .bind(limit)
        .fetch_all(db)
        .await?;
    Ok(questions)
}

/**
 * Return every published question, newest first
 */
pub async fn all(db: &SqlitePool) -> Result<Vec<Question>> {
    let questions = sqlx::query_as::<_, Question>(VISIBLE_QUESTIONS)
        .bind(Utc::now())
        .fetch_all(db)
        .await?;
    Ok(questions)
}

/**
 * Return the questions with the most votes across all their choices
 *
 * Questions whose choices have no votes yet still show up with a total of
 * zero. Ties are broken by question id so the ordering is deterministic.
 */
pub async fn popular(db: &SqlitePool, limit: i64) -> Result<Vec<QuestionSummary>> {
    let questions = sqlx::query_as::<_, QuestionSummary>(
        r#"
        SELECT q.id, q.question_text, q.pub_date, SUM(c.votes) AS total_votes
        FROM questions q
        JOIN choices c ON c.question_id = q.id
        WHERE q.pub_date <= ?
        GROUP BY q.id
        ORDER BY total_votes DESC, q.id ASC
        LIMIT ?
        "#,
    )
    .bind(Utc::now())
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(questions)
}

/**
 * Fetch a single visible question along with its choices
 *
 * Used by both the detail and results pages. Questions that are unpublished
 * or have no choices look the same as absent ones to the caller.
 */
pub async fn detail(db: &SqlitePool, question_id: i64) -> Result<(Question, Vec<Choice>)> {
    let question = sqlx::query_as::<_, Question>(
        r#"
        SELECT q.id, q.question_text, q.pub_date
        FROM questions q
        WHERE q.id = ?
          AND q.pub_date <= ?
          AND EXISTS (SELECT 1 FROM choices c WHERE c.question_id = q.id)
        "#,
    )
    .bind(question_id)
    .bind(Utc::now())
    .fetch_optional(db)
    .await?
    .ok_or(Error::NotFound)?;

    let choices = choices_of(db, question.id).await?;
    Ok((question, choices))
}

/**
 * Look up a question by id with no visibility filtering
 *
 * Voting only cares that the question exists, mirroring the detail form the
 * ballot was submitted from.
 */
pub async fn find_question(db: &SqlitePool, question_id: i64) -> Result<Question> {
    sqlx::query_as::<_, Question>("SELECT id, question_text, pub_date FROM questions WHERE id = ?")
        .bind(question_id)
        .fetch_optional(db)
        .await?
        .ok_or(Error::NotFound)
}

/**
 * The choices belonging to a question, in creation order
 */
pub async fn choices_of(db: &SqlitePool, question_id: i64) -> Result<Vec<Choice>> {
    let choices = sqlx::query_as::<_, Choice>(
        "SELECT id, question_id, choice_text, votes FROM choices WHERE question_id = ? ORDER BY id ASC",
    )
    .bind(question_id)
    .fetch_all(db)
    .await?;
    Ok(choices)
}

/**
 * Record one vote for a choice on the given question
 *
 * `submitted` is the raw form value, which may be missing or arbitrary
 * text. The increment is a single relative UPDATE so simultaneous votes on
 * the same choice are never lost. Returns the question id for the redirect
 * to the results page.
 */
pub async fn record_vote(
    db: &SqlitePool,
    question_id: i64,
    submitted: Option<&str>,
) -> Result<i64> {
    let question = find_question(db, question_id).await?;

    let choice_id = match submitted.and_then(|raw| raw.trim().parse::<i64>().ok()) {
        Some(choice_id) => choice_id,
        None => return Err(Error::NoChoice),
    };

    let updated = sqlx::query("UPDATE choices SET votes = votes + 1 WHERE id = ? AND question_id = ?")
        .bind(choice_id)
        .bind(question.id)
        .execute(db)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(Error::NoChoice);
    }

    debug!("Vote recorded for choice {} on question {}", choice_id, question.id);
    Ok(question.id)
}
