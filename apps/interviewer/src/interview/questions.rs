//! Question Bank — the ordered question list for each interview track.
//!
//! Tracks are static data: either the built-in set below or a JSON file named
//! by `QUESTIONS_PATH`, shaped as `[{"name": "...", "questions": ["..."]}]`.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuestionBankError {
    #[error("Failed to read question file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid question file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Question file defines no tracks")]
    NoTracks,

    #[error("Track names must not be blank")]
    BlankTrackName,

    #[error("Track '{0}' is defined more than once")]
    DuplicateTrack(String),
}

/// A named interview variant with its own ordered question list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Track {
    pub name: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct QuestionBank {
    tracks: Vec<Track>,
}

const QA_QUESTIONS: &[&str] = &[
    "Расскажите о своём опыте в тестировании: какие продукты вы тестировали и какова была ваша роль?",
    "Чем отличаются смоук-, регрессионное и приёмочное тестирование? Когда вы применяете каждое из них?",
    "Как вы составляете тест-кейсы для новой функциональности? Какие техники тест-дизайна используете?",
    "Опишите, как вы оформляете баг-репорт. Какие поля считаете обязательными?",
    "Какой у вас опыт тестирования API? Какими инструментами пользуетесь?",
    "Приходилось ли вам писать автотесты? На каком языке и с какими фреймворками?",
    "Как вы поступите, если разработчик не согласен с тем, что найденная вами проблема является багом?",
    "Как вы решаете, что тестирование релиза завершено и продукт можно выпускать?",
];

const SALES_QUESTIONS: &[&str] = &[
    "Расскажите о своём опыте в продажах: что вы продавали и каким клиентам?",
    "Опишите свою самую успешную сделку. Что именно помогло её закрыть?",
    "Как вы ищете и квалифицируете новых клиентов?",
    "Как вы работаете с возражением «дорого»?",
    "Какие показатели вы отслеживаете в своей работе и каких результатов достигали по плану продаж?",
    "С какими CRM-системами вы работали и как ведёте в них воронку?",
    "Расскажите о случае, когда вы потеряли клиента. Какие выводы вы сделали?",
    "Почему вас интересует именно эта вакансия?",
];

impl QuestionBank {
    /// Builds a bank from explicit tracks, validating names.
    pub fn new(tracks: Vec<Track>) -> Result<Self, QuestionBankError> {
        if tracks.is_empty() {
            return Err(QuestionBankError::NoTracks);
        }
        let mut seen = HashSet::new();
        for track in &tracks {
            if track.name.trim().is_empty() {
                return Err(QuestionBankError::BlankTrackName);
            }
            if !seen.insert(track.name.as_str()) {
                return Err(QuestionBankError::DuplicateTrack(track.name.clone()));
            }
        }
        Ok(Self { tracks })
    }

    /// The two tracks the bot ships with: QA engineer and sales manager.
    pub fn builtin() -> Self {
        let owned = |qs: &[&str]| qs.iter().map(|q| q.to_string()).collect();
        Self {
            tracks: vec![
                Track {
                    name: "QA".to_string(),
                    questions: owned(QA_QUESTIONS),
                },
                Track {
                    name: "Менеджер по продажам".to_string(),
                    questions: owned(SALES_QUESTIONS),
                },
            ],
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, QuestionBankError> {
        let tracks: Vec<Track> = serde_json::from_str(raw)?;
        Self::new(tracks)
    }

    pub fn load(path: &Path) -> Result<Self, QuestionBankError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Track names in menu order.
    pub fn names(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.name.clone()).collect()
    }

    /// Looks a track up by its exact name. No trimming, no case folding.
    pub fn get(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name == name)
    }
}
