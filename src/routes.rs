/*!
 * The routes module contains all the tide routes and the logic to fulfill
 * the responses for each route.
 *
 * Handlers only translate between HTTP and the polls module: query, render
 * a template, or redirect.
 */
use log::*;
use serde_json::Value;
use tide::{Body, Request, Response, StatusCode};

use crate::polls::{self, Error};
use crate::AppState;

/**
 * Render the named template to an HTML response
 */
fn render(state: &AppState, template: &str, data: &Value) -> tide::Result {
    match state.hbs.render(template, data) {
        Ok(html) => Ok(Response::builder(StatusCode::Ok)
            .content_type(tide::http::mime::HTML)
            .body(Body::from_string(html))
            .build()),
        Err(err) => {
            error!("Failed to render {}: {:?}", template, err);
            Err(tide::Error::from_str(
                StatusCode::InternalServerError,
                "Failed to render template",
            ))
        }
    }
}

/**
 * Translate a polls error into the response the user sees
 *
 * NoChoice never reaches this point; the vote handler recovers from it by
 * re-rendering the form.
 */
fn error_response(err: Error) -> tide::Error {
    match err {
        Error::NotFound | Error::NoChoice => {
            tide::Error::from_str(StatusCode::NotFound, "Could not find question")
        }
        Error::Database(err) => {
            error!("Query failed: {:?}", err);
            tide::Error::from_str(StatusCode::InternalServerError, "Database error")
        }
    }
}

/**
 *  GET /
 */
pub async fn index(req: Request<AppState>) -> tide::Result {
    let latest = polls::latest(&req.state().db, polls::DEFAULT_LIMIT)
        .await
        .map_err(error_response)?;
    render(
        req.state(),
        "index",
        &serde_json::json!({ "latest_question_list": latest }),
    )
}

pub mod questions {
    use log::*;
    use serde::Deserialize;
    use serde_json::json;
    use tide::{Redirect, Request, StatusCode};

    use super::{error_response, render};
    use crate::polls::{self, Error};
    use crate::AppState;

    /**
     * The POST body of a ballot; `choice` is whatever the browser sent
     */
    #[derive(Debug, Deserialize)]
    struct VoteForm {
        choice: Option<String>,
    }

    fn question_id(req: &Request<AppState>) -> Result<i64, tide::Error> {
        req.param::<i64>("id").map_err(|_| {
            tide::Error::from_str(StatusCode::BadRequest, "Invalid question id")
        })
    }

    /**
     *  GET /polls/all
     */
    pub async fn all(req: Request<AppState>) -> tide::Result {
        let questions = polls::all(&req.state().db).await.map_err(error_response)?;
        render(
            req.state(),
            "all",
            &json!({ "full_question_list": questions }),
        )
    }

    /**
     *  GET /polls/popular
     */
    pub async fn popular(req: Request<AppState>) -> tide::Result {
        let questions = polls::popular(&req.state().db, polls::DEFAULT_LIMIT)
            .await
            .map_err(error_response)?;
        render(
            req.state(),
            "popular",
            &json!({ "popular_question_list": questions }),
        )
    }

    /**
     *  GET /polls/:id
     */
    pub async fn detail(req: Request<AppState>) -> tide::Result {
        let question_id = question_id(&req)?;
        let (question, choices) = polls::detail(&req.state().db, question_id)
            .await
            .map_err(error_response)?;
        render(
            req.state(),
            "detail",
            &json!({ "question": question, "choices": choices }),
        )
    }

    /**
     *  GET /polls/:id/results
     */
    pub async fn results(req: Request<AppState>) -> tide::Result {
        let question_id = question_id(&req)?;
        let (question, choices) = polls::detail(&req.state().db, question_id)
            .await
            .map_err(error_response)?;
        render(
            req.state(),
            "results",
            &json!({ "question": question, "choices": choices }),
        )
    }

    /**
     *  POST /polls/:id/vote
     *
     * Redirects to the results page on success so a browser reload never
     * casts a second vote. An empty or invalid selection re-renders the
     * voting form with a message instead of failing the request.
     */
    pub async fn vote(mut req: Request<AppState>) -> tide::Result {
        let question_id = question_id(&req)?;
        let ballot: VoteForm = req
            .body_form()
            .await
            .unwrap_or(VoteForm { choice: None });
        debug!("Ballot received for question {}: {:?}", question_id, ballot);

        let state = req.state();
        match polls::record_vote(&state.db, question_id, ballot.choice.as_deref()).await {
            Ok(question_id) => {
                Ok(Redirect::see_other(format!("/polls/{}/results", question_id)).into())
            }
            Err(Error::NoChoice) => {
                let question = polls::find_question(&state.db, question_id)
                    .await
                    .map_err(error_response)?;
                let choices = polls::choices_of(&state.db, question_id)
                    .await
                    .map_err(error_response)?;
                render(
                    state,
                    "detail",
                    &json!({
                        "question": question,
                        "choices": choices,
                        "error_message": "You didn't select a choice.",
                    }),
                )
            }
            Err(err) => Err(error_response(err)),
        }
    }
}
