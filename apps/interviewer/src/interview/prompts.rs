// Interview LLM prompt templates.
// One canonical instruction per phase; placeholders are filled by the render
// functions below, never by ad-hoc string concatenation in the controller.

use crate::interview::state::{AnswerRecord, Phase};

/// Instruction for judging a first answer to a main question.
/// Replace: {track}, {question}
pub const ANSWER_REVIEW_TEMPLATE: &str = "\
Ты опытный HR-специалист и проводишь собеседование на позицию «{track}». \
Кандидату задан вопрос: «{question}». Следующее сообщение — его ответ. \
Если ответ полный и понятный, или кандидат уклоняется от ответа, ответь ровно одним словом: OK. \
Если ответ неполный или неясный, задай ровно один короткий уточняющий вопрос и больше ничего не пиши. \
Не повторяй исходный вопрос, не давай оценок и не добавляй комментариев. \
Не сообщай кандидату, что его ответы анализирует ИИ или программа. \
Общайся вежливо, только на русском языке.";

/// Instruction for judging the reply to a follow-up question.
/// Replace: {track}, {question}
pub const CLARIFICATION_REVIEW_TEMPLATE: &str = "\
Ты опытный HR-специалист и проводишь собеседование на позицию «{track}». \
Кандидату был задан вопрос: «{question}», а затем один уточняющий вопрос. \
Следующее сообщение — ответ кандидата на уточнение. \
Лимит уточнений по этому вопросу исчерпан: больше ничего не спрашивай. \
Если ответ понятен, ответь ровно одним словом: OK. \
Иначе кратко и вежливо поблагодари кандидата, без новых вопросов. \
Не сообщай кандидату, что его ответы анализирует ИИ или программа. \
Пиши только на русском языке.";

/// Instruction for the final recruiter summary.
/// Replace: {track}, {full_name}
pub const SUMMARY_TEMPLATE: &str = "\
Ты профессиональный HR-специалист. \
На основе всех ответов кандидата по вакансии «{track}» и его ФИО: {full_name}, \
составь подробное резюме для HR-специалиста. \
Дай рекомендации HR-специалисту о том, какие области требуется проверить на очном собеседовании, \
если кандидат рекомендуется к дальнейшим этапам. \
Включи в резюме: ФИО кандидата; сильные и слабые стороны кандидата; \
общую рекомендацию, подходит ли кандидат для этой вакансии; \
оценку уникальности ответов и признаки того, что кандидат пользовался интернетом при ответах; \
вывод о компетенциях кандидата на основе его ответов. \
Пиши кратко, по делу, только на русском языке.";

/// Renders the review instruction for the phase the candidate is answering in.
pub fn review_instruction(phase: Phase, track: &str, question: &str) -> String {
    let template = match phase {
        Phase::Clarifying => CLARIFICATION_REVIEW_TEMPLATE,
        _ => ANSWER_REVIEW_TEMPLATE,
    };
    template
        .replace("{track}", track)
        .replace("{question}", question)
}

pub fn summary_instruction(track: &str, full_name: &str) -> String {
    SUMMARY_TEMPLATE
        .replace("{track}", track)
        .replace("{full_name}", full_name)
}

/// Serialises the collected answers as numbered question/answer blocks.
pub fn transcript(answers: &[AnswerRecord]) -> String {
    if answers.is_empty() {
        return "Кандидат не ответил ни на один вопрос.".to_string();
    }
    answers
        .iter()
        .enumerate()
        .map(|(i, record)| {
            format!(
                "{}. Вопрос: {}\nОтвет: {}",
                i + 1,
                record.question,
                record.answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
