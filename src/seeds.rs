//! Seed data: built-in quizzes that keep the service useful when no model
//! API key is configured, plus the absolute last-resort fallback.

use uuid::Uuid;

use crate::domain::{
  CanonicalQuestion, CanonicalQuiz, Difficulty, GenerationRequest, MatchPair, QuestionBody,
  QuizSource,
};

/// Minimal set of ready-made quizzes covering each difficulty tier.
pub fn seed_quizzes() -> Vec<CanonicalQuiz> {
  vec![
    CanonicalQuiz {
      id: "seed-water-cycle".into(),
      source: QuizSource::SeedBank,
      title: "Water Cycle Basics".into(),
      description: "A short check on evaporation, condensation and rain.".into(),
      category: "Science".into(),
      difficulty: Difficulty::Beginner,
      duration_minutes: 3,
      questions: vec![
        CanonicalQuestion {
          text: "Evaporation turns liquid water into water vapor.".into(),
          body: QuestionBody::TrueFalse { options: vec!["True".into(), "False".into()], answer: 0 },
          explanation: "True, because heat gives water molecules enough energy to escape into the air."
            .into(),
          points: Some(1),
          tags: vec!["water cycle".into()],
          difficulty: Some(Difficulty::Beginner),
        },
        CanonicalQuestion {
          text: "What do we call water falling from clouds as rain or snow?".into(),
          body: QuestionBody::MultipleChoice {
            options: vec![
              "Condensation".into(),
              "Precipitation".into(),
              "Evaporation".into(),
              "Collection".into(),
            ],
            answer: 1,
          },
          explanation: "Precipitation is the stage where water returns to the ground because droplets grow too heavy to stay airborne."
            .into(),
          points: Some(1),
          tags: vec!["water cycle".into()],
          difficulty: Some(Difficulty::Beginner),
        },
        CanonicalQuestion {
          text: "Clouds form when water vapor cools and turns into droplets, a process called ____."
            .into(),
          body: QuestionBody::FillBlank { answer_text: "condensation".into() },
          explanation: "Cooling air holds less vapor, so the excess condenses into visible droplets."
            .into(),
          points: Some(1),
          tags: vec!["water cycle".into()],
          difficulty: Some(Difficulty::Beginner),
        },
      ],
    },
    CanonicalQuiz {
      id: "seed-world-capitals".into(),
      source: QuizSource::SeedBank,
      title: "World Capitals".into(),
      description: "Match and pick capitals of well-known countries.".into(),
      category: "Geography".into(),
      difficulty: Difficulty::Intermediate,
      duration_minutes: 4,
      questions: vec![
        CanonicalQuestion {
          text: "Which city is the capital of Australia?".into(),
          body: QuestionBody::MultipleChoice {
            options: vec!["Sydney".into(), "Melbourne".into(), "Canberra".into(), "Perth".into()],
            answer: 2,
          },
          explanation: "Canberra was purpose-built as the capital because Sydney and Melbourne both claimed the role."
            .into(),
          points: Some(2),
          tags: vec!["capitals".into()],
          difficulty: Some(Difficulty::Intermediate),
        },
        CanonicalQuestion {
          text: "Match each country to its capital city.".into(),
          body: QuestionBody::Matching {
            pairs: vec![
              MatchPair { left: "Japan".into(), right: "Tokyo".into() },
              MatchPair { left: "Canada".into(), right: "Ottawa".into() },
              MatchPair { left: "Kenya".into(), right: "Nairobi".into() },
            ],
            answer: vec![0, 1, 2],
          },
          explanation: "Capitals are fixed by each country's constitution or law, so these pairings do not change with city size."
            .into(),
          points: Some(2),
          tags: vec!["capitals".into()],
          difficulty: Some(Difficulty::Intermediate),
        },
      ],
    },
  ]
}

/// Absolute last-resort fallback: a tiny quiz synthesized from the request
/// topic, used when the bank has nothing suitable either.
pub fn hard_fallback_quiz(req: &GenerationRequest) -> CanonicalQuiz {
  let subject = if req.subject.is_empty() { "this subject".to_string() } else { req.subject.clone() };
  CanonicalQuiz {
    id: Uuid::new_v4().to_string(),
    source: QuizSource::HardFallback,
    title: format!("{} Quiz", req.topic),
    description: format!("A placeholder quiz about {}.", req.topic),
    category: req.subject.clone(),
    difficulty: req.difficulty,
    duration_minutes: 2,
    questions: vec![
      CanonicalQuestion {
        text: format!("{} is a topic studied within {}.", req.topic, subject),
        body: QuestionBody::TrueFalse { options: vec!["True".into(), "False".into()], answer: 0 },
        explanation: format!(
          "True, because this quiz was requested for {} as part of {}.",
          req.topic, subject
        ),
        points: Some(1),
        tags: vec![],
        difficulty: Some(req.difficulty),
      },
      CanonicalQuestion {
        text: format!("Learning about {} requires no practice at all.", req.topic),
        body: QuestionBody::TrueFalse { options: vec!["True".into(), "False".into()], answer: 1 },
        explanation: "False, because any topic takes deliberate practice to master.".into(),
        points: Some(1),
        tags: vec![],
        difficulty: Some(req.difficulty),
      },
    ],
  }
}
