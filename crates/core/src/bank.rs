//! The load-once question catalog sessions draw from.

use std::collections::HashSet;
use std::io::Read;

use thiserror::Error;

use crate::model::{
    CorrectAnswer, Difficulty, LearningPreference, Question, QuestionError, QuestionId,
    QuestionType,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error("duplicate question id: {0}")]
    DuplicateId(QuestionId),

    #[error("invalid question bank JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read-only catalog of validated questions, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Builds a bank, validating every question and id uniqueness.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Question` for an invalid question and
    /// `BankError::DuplicateId` when two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            question.validate()?;
            if !seen.insert(question.id.clone()) {
                return Err(BankError::DuplicateId(question.id.clone()));
            }
        }
        Ok(Self { questions })
    }

    /// Bank with no questions. Starting a session against it fails.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a JSON array of questions.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Json` on malformed input, or a validation error.
    pub fn from_json(raw: &str) -> Result<Self, BankError> {
        let questions: Vec<Question> = serde_json::from_str(raw)?;
        Self::new(questions)
    }

    /// # Errors
    ///
    /// See [`QuestionBank::from_json`].
    pub fn from_reader(reader: impl Read) -> Result<Self, BankError> {
        let questions: Vec<Question> = serde_json::from_reader(reader)?;
        Self::new(questions)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }

    /// Case-insensitive subject match.
    #[must_use]
    pub fn by_subject(&self, subject: &str) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.subject.eq_ignore_ascii_case(subject))
            .collect()
    }

    #[must_use]
    pub fn by_difficulty(&self, difficulty: Difficulty) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.difficulty == difficulty)
            .collect()
    }

    #[must_use]
    pub fn by_preference(&self, preference: LearningPreference) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.learning_preference == preference)
            .collect()
    }

    /// Questions carrying at least one of `tags`.
    #[must_use]
    pub fn by_tags(&self, tags: &[&str]) -> Vec<&Question> {
        self.questions.iter().filter(|q| q.has_any_tag(tags)).collect()
    }

    /// Distinct subjects in catalog order.
    #[must_use]
    pub fn subjects(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.questions
            .iter()
            .map(|q| q.subject.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// The stock catalog shipped with the app.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            questions: builtin_questions(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn mc(
    id: &str,
    prompt: &str,
    options: [&str; 4],
    answer: &str,
    explanation: &str,
    difficulty: Difficulty,
    preference: LearningPreference,
    subject: &str,
    tags: [&str; 2],
) -> Question {
    Question {
        id: QuestionId::new(id),
        kind: QuestionType::MultipleChoice,
        prompt: prompt.to_owned(),
        options: Some(options.iter().map(|o| (*o).to_owned()).collect()),
        correct_answer: CorrectAnswer::Single(answer.to_owned()),
        explanation: explanation.to_owned(),
        difficulty,
        learning_preference: preference,
        subject: subject.to_owned(),
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
    }
}

#[allow(clippy::too_many_lines)]
fn builtin_questions() -> Vec<Question> {
    use Difficulty::{Easy, Medium};
    use LearningPreference::{Auditory, Kinesthetic, ReadingWriting, Visual};

    vec![
        mc(
            "v1",
            "What is the name of the planet we live on?",
            ["Saturn", "Earth", "Venus", "Mars"],
            "Earth",
            "Earth is the third planet from the Sun and the only astronomical object known to harbor life.",
            Easy,
            Visual,
            "Science",
            ["astronomy", "planets"],
        ),
        mc(
            "v2",
            "Which of the following is a primary color?",
            ["Green", "Purple", "Red", "Orange"],
            "Red",
            "Red is one of the three primary colors along with blue and yellow.",
            Easy,
            Visual,
            "Art",
            ["colors", "art-theory"],
        ),
        mc(
            "v3",
            "What shape has 4 equal sides and 4 right angles?",
            ["Triangle", "Circle", "Square", "Rectangle"],
            "Square",
            "A square is a quadrilateral with four equal sides and four right angles.",
            Easy,
            Visual,
            "Mathematics",
            ["geometry", "shapes"],
        ),
        mc(
            "v4",
            "Which animal is known for its black and white stripes?",
            ["Lion", "Tiger", "Zebra", "Elephant"],
            "Zebra",
            "Zebras are known for their distinctive black and white striped coat pattern.",
            Easy,
            Visual,
            "Biology",
            ["animals", "patterns"],
        ),
        mc(
            "a1",
            "Which musical instrument is known as the 'king of instruments'?",
            ["Piano", "Violin", "Organ", "Guitar"],
            "Organ",
            "The pipe organ is often called the 'king of instruments' due to its size, complexity, and powerful sound.",
            Medium,
            Auditory,
            "Music",
            ["instruments", "classical-music"],
        ),
        mc(
            "a2",
            "What is the term for the speed of music?",
            ["Pitch", "Tempo", "Volume", "Rhythm"],
            "Tempo",
            "Tempo refers to the speed or pace of a piece of music.",
            Easy,
            Auditory,
            "Music",
            ["music-theory", "tempo"],
        ),
        mc(
            "a3",
            "Which language has the most native speakers in the world?",
            ["English", "Spanish", "Mandarin Chinese", "Hindi"],
            "Mandarin Chinese",
            "Mandarin Chinese has the most native speakers, with over 1 billion people speaking it as their first language.",
            Medium,
            Auditory,
            "Language",
            ["languages", "statistics"],
        ),
        mc(
            "k1",
            "What is 2 + 2?",
            ["3", "4", "5", "6"],
            "4",
            "Basic arithmetic: 2 + 2 = 4",
            Easy,
            Kinesthetic,
            "Mathematics",
            ["arithmetic", "basic-math"],
        ),
        mc(
            "k2",
            "How many sides does a triangle have?",
            ["2", "3", "4", "5"],
            "3",
            "A triangle is a polygon with exactly three sides and three angles.",
            Easy,
            Kinesthetic,
            "Mathematics",
            ["geometry", "polygons"],
        ),
        mc(
            "k3",
            "What is the result of 5 × 6?",
            ["25", "30", "35", "40"],
            "30",
            "Multiplication: 5 × 6 = 30",
            Easy,
            Kinesthetic,
            "Mathematics",
            ["multiplication", "arithmetic"],
        ),
        mc(
            "k4",
            "Which sport involves hitting a ball with a racket over a net?",
            ["Soccer", "Tennis", "Basketball", "Baseball"],
            "Tennis",
            "Tennis is a racket sport that involves hitting a ball over a net.",
            Easy,
            Kinesthetic,
            "Sports",
            ["racket-sports", "physical-activity"],
        ),
        mc(
            "r1",
            "What is the capital of France?",
            ["London", "Berlin", "Paris", "Madrid"],
            "Paris",
            "Paris is the capital and most populous city of France.",
            Easy,
            ReadingWriting,
            "Geography",
            ["capitals", "europe"],
        ),
        mc(
            "r2",
            "Who wrote 'Romeo and Juliet'?",
            ["Charles Dickens", "William Shakespeare", "Jane Austen", "Mark Twain"],
            "William Shakespeare",
            "William Shakespeare wrote the famous tragedy 'Romeo and Juliet' in the late 16th century.",
            Medium,
            ReadingWriting,
            "Literature",
            ["shakespeare", "classic-literature"],
        ),
        mc(
            "r3",
            "What is the main purpose of a dictionary?",
            ["To tell stories", "To define words", "To show pictures", "To teach grammar"],
            "To define words",
            "A dictionary is a reference book that contains definitions, pronunciations, and other information about words.",
            Easy,
            ReadingWriting,
            "Language",
            ["reference-books", "vocabulary"],
        ),
        mc(
            "r4",
            "Which punctuation mark is used to end a declarative sentence?",
            ["Question mark (?)", "Exclamation point (!)", "Period (.)", "Comma (,)"],
            "Period (.)",
            "A period (.) is used to end declarative sentences, which make statements.",
            Easy,
            ReadingWriting,
            "Language",
            ["punctuation", "grammar"],
        ),
        mc(
            "m1",
            "What is the chemical symbol for gold?",
            ["Ag", "Au", "Fe", "Cu"],
            "Au",
            "Au comes from the Latin word 'aurum' which means gold.",
            Medium,
            Visual,
            "Chemistry",
            ["chemical-symbols", "elements"],
        ),
        mc(
            "m2",
            "Which planet is known as the Red Planet?",
            ["Venus", "Mars", "Jupiter", "Saturn"],
            "Mars",
            "Mars is called the Red Planet due to its reddish appearance, caused by iron oxide on its surface.",
            Medium,
            Visual,
            "Science",
            ["planets", "astronomy"],
        ),
        mc(
            "m3",
            "What is the largest ocean on Earth?",
            ["Atlantic Ocean", "Indian Ocean", "Arctic Ocean", "Pacific Ocean"],
            "Pacific Ocean",
            "The Pacific Ocean is the largest and deepest ocean on Earth, covering about one-third of the Earth's surface.",
            Medium,
            ReadingWriting,
            "Geography",
            ["oceans", "earth-science"],
        ),
    ]
}
