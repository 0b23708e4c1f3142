use std::sync::{Arc, MutexGuard};
use std::time::Duration;

use services::quiz::shared;
use services::{
    AppServices, QuizOptions, QuizSession, SessionError, SessionTimer, SharedQuizSession,
};
use tutor_core::model::{Answer, CompletionReason, CorrectAnswer, Question, UserId};
use tutor_core::results::ResultsSummary;
use tutor_core::selector::{SeededRandom, ThreadRandom};

use crate::term::{Prompt, flush_prompt};

const COMPLETION_POLL: Duration = Duration::from_millis(250);

pub async fn run_quiz(
    services: &AppServices,
    user_id: UserId,
    options: QuizOptions,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let quiz_loop = services.quiz_loop();
    let session = match seed {
        Some(seed) => {
            quiz_loop
                .start_for_user_with(user_id, options, &mut SeededRandom::new(seed))
                .await?
        }
        None => {
            quiz_loop
                .start_for_user_with(user_id, options, &mut ThreadRandom)
                .await?
        }
    };

    println!(
        "{} ({}): {} questions, {} minutes.",
        session.title(),
        session.subject(),
        session.total_questions(),
        session.time_limit_minutes()
    );
    println!("Answer by number or text. Empty line skips, `quit` abandons.");

    let session = shared(session);
    let timer = SessionTimer::spawn_per_second(Arc::clone(&session), services.clock());
    let mut prompt = Prompt::stdin();

    loop {
        let (question, header) = {
            let guard = lock(&session)?;
            let Some(question) = guard.current_question().cloned() else {
                break;
            };
            let progress = guard.progress();
            let header = format!(
                "[{}/{}] {} left",
                progress.index + 1,
                progress.total,
                guard.format_remaining()
            );
            (question, header)
        };

        print_question(&header, &question);
        flush_prompt("> ");

        let line = tokio::select! {
            line = prompt.next_line() => line?,
            () = wait_for_completion(&session) => {
                println!();
                println!("Time's up!");
                break;
            }
        };

        let Some(line) = line else {
            println!();
            println!("Quiz abandoned; nothing was saved.");
            timer.cancel();
            return Ok(());
        };
        if line == "quit" {
            println!("Quiz abandoned; nothing was saved.");
            timer.cancel();
            return Ok(());
        }

        let now = services.clock().now();
        let mut guard = lock(&session)?;
        if guard.is_completed() {
            println!("Time's up!");
            break;
        }
        if line.is_empty() {
            println!("Skipped. Correct answer: {}", question.correct_answer);
        } else {
            let Some(answer) = parse_answer(&question, &line) else {
                println!("Not a valid choice.");
                continue;
            };
            let submission = guard.submit(answer, now)?;
            if submission.record().is_correct {
                println!("Correct!");
            } else {
                println!("Incorrect. Correct answer: {}", question.correct_answer);
            }
            println!("{}", question.explanation);
        }
        guard.advance(now)?;
    }

    timer.cancel();
    let id = quiz_loop.finish_shared(user_id, &session).await?;
    let guard = lock(&session)?;
    if guard.completion_reason() == Some(CompletionReason::TimedOut) {
        println!("The quiz ended when time ran out.");
    }
    print_summary(&guard.results()?);
    println!("Saved as result #{id}.");
    Ok(())
}

fn lock(session: &SharedQuizSession) -> Result<MutexGuard<'_, QuizSession>, SessionError> {
    session
        .lock()
        .map_err(|e| SessionError::Poisoned(e.to_string()))
}

/// Resolves once the timer has completed the session.
async fn wait_for_completion(session: &SharedQuizSession) {
    loop {
        tokio::time::sleep(COMPLETION_POLL).await;
        match session.lock() {
            Ok(guard) if !guard.is_completed() => {}
            _ => return,
        }
    }
}

fn print_question(header: &str, question: &Question) {
    println!();
    println!(
        "{header} | {} | {} | {}",
        question.subject, question.difficulty, question.learning_preference
    );
    println!("{}", question.prompt);
    if let Some(options) = &question.options {
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }
    }
    if matches!(question.correct_answer, CorrectAnswer::Multiple(_)) {
        println!("(several answers; separate them with commas)");
    }
}

/// Turn a typed line into an answer. Numbers pick from the options, anything else
/// is matched against option text, or taken as-is for open questions.
fn parse_answer(question: &Question, input: &str) -> Option<Answer> {
    let pick = |token: &str| -> Option<String> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        match &question.options {
            Some(options) => {
                if let Ok(n) = token.parse::<usize>() {
                    return options.get(n.checked_sub(1)?).cloned();
                }
                options
                    .iter()
                    .find(|o| o.eq_ignore_ascii_case(token))
                    .cloned()
            }
            None => Some(token.to_owned()),
        }
    };

    match question.correct_answer {
        CorrectAnswer::Multiple(_) => {
            let picked: Option<Vec<String>> = input.split(',').map(pick).collect();
            Some(Answer::multiple(picked?))
        }
        CorrectAnswer::Single(_) => pick(input).map(Answer::Single),
    }
}

fn print_summary(summary: &ResultsSummary) {
    println!();
    println!("== {} ==", summary.band.label());
    println!("{}", summary.band.message());
    println!(
        "Score: {}/{} ({}%), {} incorrect, time {}",
        summary.score,
        summary.total,
        summary.percentage,
        summary.incorrect(),
        summary.time_spent_display()
    );
    if !summary.breakdown.is_empty() {
        println!("By learning style:");
        for row in &summary.breakdown {
            println!(
                "  {:<16} {}/{} ({}%) {}",
                row.preference.as_str(),
                row.correct,
                row.total,
                row.percentage,
                row.message()
            );
        }
    }
    let strengths: Vec<&str> = summary.strengths().map(|r| r.preference.as_str()).collect();
    if !strengths.is_empty() {
        println!("Strengths: {}", strengths.join(", "));
    }
    let improve: Vec<&str> = summary
        .improvement_areas()
        .map(|r| r.preference.as_str())
        .collect();
    if !improve.is_empty() {
        println!("Work on: {}", improve.join(", "));
    }
}
