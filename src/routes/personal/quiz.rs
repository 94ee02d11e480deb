// Money personality quiz: ten yes/no questions, one negatively keyed.

use std::{sync::Arc, time::SystemTime};

use askama::Template;
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Response},
};
use mongodb::bson::DateTime;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::QuizResult;
use crate::routes::helpers::render;
use crate::session::ToolVisitor;
use crate::state::{AppState, insert_quiz_result, log_tool_usage};

pub const MAX_SCORE: i32 = 30;

struct Question {
    text: &'static str,
    /// Whether "Yes" is the financially healthy answer.
    positive: bool,
}

const QUESTIONS: &[Question] = &[
    Question { text: "Do you track your income and expenses?", positive: true },
    Question { text: "Do you save a portion of your income every month?", positive: true },
    Question { text: "Do you have a written budget?", positive: true },
    Question { text: "Do you set financial goals for the year?", positive: true },
    Question { text: "Do you compare prices before large purchases?", positive: true },
    Question { text: "Do you often borrow to cover everyday expenses?", positive: false },
    Question { text: "Do you have money set aside for emergencies?", positive: true },
    Question { text: "Do you review your spending at the end of the month?", positive: true },
    Question { text: "Do you avoid impulse purchases?", positive: true },
    Question { text: "Do you plan for large yearly expenses in advance?", positive: true },
];

pub fn calculate_score(answers: &[String]) -> i32 {
    let mut score = 0;
    for (question, answer) in QUESTIONS.iter().zip(answers) {
        let yes = answer == "Yes";
        let keyed = if question.positive { yes } else { !yes };
        if keyed {
            score += 3;
        } else {
            score -= 1;
        }
    }
    score.max(0)
}

pub fn assign_personality(score: i32) -> (&'static str, &'static str) {
    if score >= 21 {
        ("Planner", "You plan your finances meticulously.")
    } else if score >= 13 {
        ("Saver", "You prioritize saving consistently.")
    } else if score >= 7 {
        ("Balanced", "You maintain a balanced financial approach.")
    } else if score >= 3 {
        ("Spender", "You enjoy spending freely.")
    } else {
        ("Avoider", "You avoid financial planning.")
    }
}

pub fn assign_badges(score: i32) -> Vec<&'static str> {
    let mut badges = Vec::new();
    if score >= 21 {
        badges.push("Master Planner");
    } else if score >= 13 {
        badges.push("Consistent Saver");
    } else if score >= 7 {
        badges.push("Steady Hand");
    }
    badges
}

#[derive(Template)]
#[template(path = "personal/quiz.html")]
struct QuizTemplate {
    questions: Vec<QuestionRow>,
    errors: Option<String>,
}

struct QuestionRow {
    index: usize,
    text: String,
}

fn question_rows() -> Vec<QuestionRow> {
    QUESTIONS
        .iter()
        .enumerate()
        .map(|(i, q)| QuestionRow {
            index: i + 1,
            text: q.text.to_string(),
        })
        .collect()
}

#[derive(Template)]
#[template(path = "personal/quiz_result.html")]
struct QuizResultTemplate {
    score: i32,
    max_score: i32,
    personality: String,
    description: String,
    badges: Vec<String>,
}

#[derive(Deserialize)]
pub struct QuizForm {
    question_1: String,
    question_2: String,
    question_3: String,
    question_4: String,
    question_5: String,
    question_6: String,
    question_7: String,
    question_8: String,
    question_9: String,
    question_10: String,
}

impl QuizForm {
    fn answers(&self) -> Vec<String> {
        vec![
            self.question_1.clone(),
            self.question_2.clone(),
            self.question_3.clone(),
            self.question_4.clone(),
            self.question_5.clone(),
            self.question_6.clone(),
            self.question_7.clone(),
            self.question_8.clone(),
            self.question_9.clone(),
            self.question_10.clone(),
        ]
    }
}

pub async fn quiz_page(visitor: ToolVisitor) -> Result<Response, AppError> {
    let mut response = render(QuizTemplate {
        questions: question_rows(),
        errors: None,
    })?
    .into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}

pub async fn quiz_submit(
    State(state): State<Arc<AppState>>,
    visitor: ToolVisitor,
    Form(form): Form<QuizForm>,
) -> Result<Response, AppError> {
    let answers = form.answers();
    if answers.iter().any(|a| a != "Yes" && a != "No") {
        let mut response = render(QuizTemplate {
            questions: question_rows(),
            errors: Some("Answer every question with Yes or No".to_string()),
        })?
        .into_response();
        visitor.attach_cookie(&mut response);
        return Ok(response);
    }

    let score = calculate_score(&answers);
    let (personality, description) = assign_personality(score);
    let badges: Vec<String> = assign_badges(score).iter().map(|b| b.to_string()).collect();

    let record = QuizResult {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: visitor.user_id().map(str::to_string),
        session_id: visitor.session_id.clone(),
        answers,
        score,
        personality: personality.to_string(),
        badges: badges.clone(),
        created_at: DateTime::from_system_time(SystemTime::now()),
    };
    insert_quiz_result(&state, &record).await?;
    log_tool_usage(
        &state,
        "quiz",
        visitor.user_id(),
        &visitor.session_id,
        "submit_quiz",
    )
    .await?;

    let mut response = render(QuizResultTemplate {
        score,
        max_score: MAX_SCORE,
        personality: personality.to_string(),
        description: description.to_string(),
        badges,
    })?
    .into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn all_healthy_answers_hit_the_maximum() {
        // Question 6 is negatively keyed, so the healthy answer there is No.
        let a = answers(&["Yes", "Yes", "Yes", "Yes", "Yes", "No", "Yes", "Yes", "Yes", "Yes"]);
        assert_eq!(calculate_score(&a), MAX_SCORE);
        assert_eq!(assign_personality(MAX_SCORE).0, "Planner");
    }

    #[test]
    fn all_unhealthy_answers_floor_at_zero() {
        let a = answers(&["No", "No", "No", "No", "No", "Yes", "No", "No", "No", "No"]);
        assert_eq!(calculate_score(&a), 0);
        assert_eq!(assign_personality(0).0, "Avoider");
    }

    #[test]
    fn middling_answers_land_in_saver_territory() {
        // Five healthy answers: 5*3 - 5*1 = 10.
        let a = answers(&["Yes", "Yes", "Yes", "Yes", "Yes", "Yes", "No", "No", "No", "No"]);
        assert_eq!(calculate_score(&a), 10);
        assert_eq!(assign_personality(10).0, "Balanced");
    }
}
