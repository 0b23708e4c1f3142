use std::str::FromStr;

use chrono::Weekday;
use services::{AppServices, OnboardingError, OnboardingStep, OnboardingWizard};
use tutor_core::model::{
    CourseId, LearningHours, LearningPreference, SessionDuration, UserId, available_courses,
};

use crate::term::{Prompt, flush_prompt};

pub async fn run_onboarding(
    services: &AppServices,
    user_id: UserId,
) -> Result<(), Box<dyn std::error::Error>> {
    if services.onboarding().load(user_id).await?.is_some() {
        println!("Stored preferences for user {user_id} will be replaced.");
    }

    let mut wizard = OnboardingWizard::new();
    let mut prompt = Prompt::stdin();

    loop {
        print_step(&wizard);
        flush_prompt("> ");
        let Some(line) = prompt.next_line().await? else {
            println!();
            println!("Onboarding cancelled.");
            return Ok(());
        };

        match line.as_str() {
            "q" | "quit" => {
                println!("Onboarding cancelled.");
                return Ok(());
            }
            "b" | "back" => {
                if !wizard.retreat() {
                    println!("Already at the first step.");
                }
            }
            "" | "n" | "next" => {
                if wizard.step() == OnboardingStep::Confirmation {
                    let saved = match services.onboarding().complete(user_id, &wizard).await {
                        Ok(saved) => saved,
                        Err(OnboardingError::Incomplete { step }) => {
                            println!("{}", incomplete_hint(step));
                            continue;
                        }
                        Err(err) => return Err(err.into()),
                    };
                    println!(
                        "Saved {} learning preference(s) for user {user_id}. Run `quiz` to start learning.",
                        saved.learning_preferences.len()
                    );
                    return Ok(());
                }
                if !wizard.advance() {
                    println!("{}", incomplete_hint(wizard.step()));
                }
            }
            input => match apply_edit(&mut wizard, input) {
                Ok(message) | Err(message) => println!("{message}"),
            },
        }
    }
}

fn incomplete_hint(step: OnboardingStep) -> &'static str {
    match step {
        OnboardingStep::LearningPreference => "Pick at least one learning style first.",
        OnboardingStep::LearningHours => "Pick a time of day first.",
        OnboardingStep::SchedulePreferences => {
            "Add at least one day, and give every day a duration."
        }
        OnboardingStep::SelectCourses => "Pick at least one course first.",
        OnboardingStep::Confirmation => "",
    }
}

fn print_step(wizard: &OnboardingWizard) {
    let step = wizard.step();
    let state = wizard.state();
    println!();
    println!(
        "== Step {} of {} ({}%): {} ==",
        step.index() + 1,
        OnboardingStep::ALL.len(),
        wizard.progress_percent(),
        step.title()
    );

    match step {
        OnboardingStep::LearningPreference => {
            for (i, pref) in LearningPreference::ALL.iter().enumerate() {
                let mark = if state.learning_preferences().contains(pref) { "x" } else { " " };
                println!("  [{mark}] {}. {pref}: {}", i + 1, pref.description());
            }
            println!("Toggle with numbers or names, e.g. `1 3`.");
        }
        OnboardingStep::LearningHours => {
            for (i, hours) in LearningHours::ALL.iter().enumerate() {
                let mark = if state.learning_hours() == Some(*hours) { "x" } else { " " };
                println!("  [{mark}] {}. {hours} ({})", i + 1, hours.window());
            }
        }
        OnboardingStep::SchedulePreferences => {
            if state.schedule().is_empty() {
                println!("  (no days yet)");
            }
            for (i, entry) in state.schedule().iter().enumerate() {
                println!("  {}. {entry}", i + 1);
            }
            let durations: Vec<&str> = SessionDuration::ALL.iter().map(|d| d.label()).collect();
            println!("Use `add <day> <duration>` or `remove <n>`. Durations: {}", durations.join(" | "));
        }
        OnboardingStep::SelectCourses => {
            for (i, course) in available_courses().iter().enumerate() {
                let selected = state.selected_courses().contains(&CourseId::new(course.id));
                let mark = if selected { "x" } else { " " };
                println!("  [{mark}] {}. {} - {}", i + 1, course.name, course.description);
            }
        }
        OnboardingStep::Confirmation => {
            let prefs: Vec<&str> = state
                .learning_preferences()
                .iter()
                .map(|p| p.as_str())
                .collect();
            println!("  Learning styles: {}", prefs.join(", "));
            if let Some(hours) = state.learning_hours() {
                println!("  Preferred time:  {hours} ({})", hours.window());
            }
            for entry in state.schedule() {
                println!("  Schedule:        {entry}");
            }
            let courses: Vec<&str> = state
                .selected_courses()
                .iter()
                .map(CourseId::as_str)
                .collect();
            println!("  Courses:         {}", courses.join(", "));
            println!("Press enter to save.");
        }
    }
    println!("`next`, `back` or `quit`.");
}

/// Apply one line of step-specific input. Both arms carry a message for the learner.
fn apply_edit(wizard: &mut OnboardingWizard, input: &str) -> Result<String, String> {
    match wizard.step() {
        OnboardingStep::LearningPreference => {
            let mut changed = Vec::new();
            for token in input.split([' ', ',']).filter(|t| !t.is_empty()) {
                let pref = pick(&LearningPreference::ALL, token, LearningPreference::parse)
                    .ok_or_else(|| format!("Unknown learning style: {token}"))?;
                let on = wizard.toggle_preference(pref);
                changed.push(format!("{pref} {}", if on { "on" } else { "off" }));
            }
            Ok(changed.join(", "))
        }
        OnboardingStep::LearningHours => {
            let hours = pick(&LearningHours::ALL, input, LearningHours::parse)
                .ok_or_else(|| format!("Unknown time of day: {input}"))?;
            wizard.set_learning_hours(Some(hours));
            Ok(format!("Learning at {hours}"))
        }
        OnboardingStep::SchedulePreferences => edit_schedule(wizard, input),
        OnboardingStep::SelectCourses => {
            let courses = available_courses();
            let id = match input.parse::<usize>() {
                Ok(n) => n
                    .checked_sub(1)
                    .and_then(|i| courses.get(i))
                    .map(|c| CourseId::new(c.id))
                    .ok_or_else(|| format!("No course number {n}"))?,
                Err(_) => CourseId::new(input.to_ascii_lowercase()),
            };
            let on = wizard.toggle_course(id.clone()).map_err(|e| e.to_string())?;
            Ok(format!("{id} {}", if on { "selected" } else { "removed" }))
        }
        OnboardingStep::Confirmation => Err("Press enter to save, or `back` to edit.".into()),
    }
}

fn edit_schedule(wizard: &mut OnboardingWizard, input: &str) -> Result<String, String> {
    let (command, rest) = input.split_once(' ').unwrap_or((input, ""));
    match command {
        "add" => {
            let (day, duration) = rest.trim().split_once(' ').unwrap_or((rest.trim(), ""));
            let day = Weekday::from_str(day).map_err(|_| format!("Unknown day: {day}"))?;
            let duration = pick(&SessionDuration::ALL, duration, SessionDuration::parse);

            let row = wizard.add_schedule_entry();
            if let Err(err) = wizard.set_schedule_day(row, day) {
                let _ = wizard.remove_schedule_entry(row);
                return Err(err.to_string());
            }
            wizard
                .set_schedule_duration(row, duration)
                .map_err(|e| e.to_string())?;
            Ok(wizard.state().schedule()[row].to_string())
        }
        "remove" => {
            let n: usize = rest
                .trim()
                .parse()
                .map_err(|_| format!("Not a row number: {rest}"))?;
            wizard
                .remove_schedule_entry(n.wrapping_sub(1))
                .map_err(|e| e.to_string())?;
            Ok(format!("Removed row {n}"))
        }
        _ => Err("Use `add <day> <duration>` or `remove <n>`.".into()),
    }
}

/// Resolve a 1-based menu number or a name against `all`.
fn pick<T: Copy>(all: &[T], token: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    match token.trim().parse::<usize>() {
        Ok(n) => n.checked_sub(1).and_then(|i| all.get(i)).copied(),
        Err(_) => parse(token),
    }
}
