#![allow(dead_code)]

use std::sync::Arc;

use exam_core::QuestionCatalog;
use exam_core::model::{Field, Question, QuestionId};

pub fn question(id: String, field: Field, category: &str) -> Question {
    Question::new(
        QuestionId::new(id),
        field,
        category,
        "Which option is right?",
        vec!["a".into(), "b".into(), "c".into(), "d".into()],
        1,
        "Option b.",
    )
    .unwrap()
}

/// Catalog with the given number of questions per field.
pub fn catalog(strategy: usize, management: usize, technology: usize) -> Arc<QuestionCatalog> {
    let mut questions = Vec::new();
    for i in 0..strategy {
        let category = if i % 2 == 0 { "law" } else { "accounting" };
        questions.push(question(format!("st-{i}"), Field::Strategy, category));
    }
    for i in 0..management {
        questions.push(question(format!("ma-{i}"), Field::Management, "project"));
    }
    for i in 0..technology {
        let category = if i % 3 == 0 { "security" } else { "network" };
        questions.push(question(format!("te-{i}"), Field::Technology, category));
    }
    Arc::new(QuestionCatalog::from_questions(questions).unwrap())
}

/// Index of a wrong option for `question`.
pub fn wrong_option(question: &Question) -> usize {
    (question.correct_answer() + 1) % question.options().len()
}
