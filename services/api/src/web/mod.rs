pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;

pub use middleware::require_auth;
pub use rest::{
    approve_passage_handler, approve_question_batch_handler, fetch_passages_handler,
    fetch_questions_handler, generate_passage_handler, generate_question_drafts_handler,
    generate_study_plan_handler, save_practice_attempt_handler,
};
