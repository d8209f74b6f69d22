use quiz_core::model::SessionPhase;
use quiz_core::scoring::ReviewOutcome;
use services::{QuizController, QuizEvent, QuizSession};

/// One line of terminal input, decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    Event(QuizEvent),
    Show,
    Help,
    Quit { force: bool },
}

/// Questions and options are shown 1-based; events carry 0-based indices.
pub fn parse_command(line: &str) -> Option<ShellCommand> {
    let mut words = line.split_whitespace();
    let head = words.next()?;
    let command = match head {
        "r" | "resume" => ShellCommand::Event(QuizEvent::Resume),
        "d" | "discard" => ShellCommand::Event(QuizEvent::Discard),
        "n" | "next" => ShellCommand::Event(QuizEvent::NextBatch),
        "p" | "prev" => ShellCommand::Event(QuizEvent::PreviousBatch),
        "g" | "goto" => {
            let batch = parse_ordinal(words.next()?)?;
            ShellCommand::Event(QuizEvent::GoToBatch(batch))
        }
        "a" | "answer" => {
            let index = parse_ordinal(words.next()?)?;
            let option = parse_option(words.next()?)?;
            ShellCommand::Event(QuizEvent::Select { index, option })
        }
        "s" | "submit" => ShellCommand::Event(QuizEvent::RequestSubmit),
        "y" | "yes" => ShellCommand::Event(QuizEvent::ConfirmSubmit),
        "c" | "cancel" => ShellCommand::Event(QuizEvent::CancelSubmit),
        "retake" => ShellCommand::Event(QuizEvent::Retake),
        "show" | "l" => ShellCommand::Show,
        "help" | "?" => ShellCommand::Help,
        "q" | "quit" => ShellCommand::Quit { force: false },
        "q!" | "quit!" => ShellCommand::Quit { force: true },
        _ => return None,
    };
    if words.next().is_some() {
        return None;
    }
    Some(command)
}

fn parse_ordinal(raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok()?.checked_sub(1)
}

/// Accepts `b` or `2` for the second option.
fn parse_option(raw: &str) -> Option<usize> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_ascii_alphabetic() => {
            Some(usize::from(letter.to_ascii_lowercase() as u8 - b'a'))
        }
        _ => parse_ordinal(raw),
    }
}

fn option_label(option: usize) -> char {
    u8::try_from(option)
        .ok()
        .filter(|o| *o < 26)
        .map_or('?', |o| char::from(b'a' + o))
}

pub fn print_help() {
    println!("Commands:");
    println!("  r | d              resume or discard saved progress");
    println!("  a <q> <opt>        answer question <q> with option <opt> (letter or number)");
    println!("  n | p | g <batch>  next, previous, or jump to a batch");
    println!("  s | y | c          request submit, confirm, cancel");
    println!("  retake             start the chapter over");
    println!("  show               redraw the current view");
    println!("  q | q!             quit (q! skips the unsaved-attempt warning)");
}

pub fn render(controller: &QuizController) {
    let Some(session) = controller.session() else {
        match controller.content() {
            Some(content) => println!(
                "{} is not a quiz ({:?}); nothing to do.",
                content.title.as_deref().unwrap_or(content.chapter_id.as_str()),
                content.kind
            ),
            None => println!("No content loaded."),
        }
        return;
    };

    match session.phase() {
        SessionPhase::Idle => println!("Quiz not started."),
        SessionPhase::ResumePrompt => {
            let answered = session
                .pending_snapshot()
                .map_or(0, |snapshot| snapshot.answer_map.len());
            println!(
                "Saved progress found for {} ({answered} answered). Resume (r) or discard (d)?",
                session.chapter_id()
            );
        }
        SessionPhase::Active => render_batch(session),
        SessionPhase::SubmitConfirm => {
            let progress = session.progress();
            println!(
                "Submit {} of {} answers? (y to confirm, c to keep going)",
                progress.answered, progress.total
            );
        }
        SessionPhase::Results => render_results(session),
    }
}

fn render_header(session: &QuizSession) {
    let progress = session.progress();
    println!(
        "== {} | batch {}/{} | answered {}/{} | {} ==",
        session.chapter_id(),
        progress.batch_index + 1,
        progress.page_count.max(1),
        progress.answered,
        progress.total,
        format_elapsed(progress.elapsed_seconds),
    );
    if progress.phase.is_active() {
        if progress.can_submit() {
            println!("Submission unlocked (s).");
        } else {
            println!("Answer {} more to unlock submission.", progress.remaining_to_unlock());
        }
    }
}

fn render_batch(session: &QuizSession) {
    render_header(session);
    let start = session.current_batch_range().start;
    for (offset, question) in session.current_batch().iter().enumerate() {
        let index = start + offset;
        let selected = session.answers().get(index);
        println!("{}. {}", index + 1, question.question());
        for (option, text) in question.options().iter().enumerate() {
            let marker = if selected == Some(option) { '*' } else { ' ' };
            println!("   {marker} {}) {text}", option_label(option));
        }
    }
}

fn render_results(session: &QuizSession) {
    render_header(session);
    let Some(result) = session.result() else {
        return;
    };
    println!(
        "Score: {}/{} in {}",
        result.score(),
        result.total(),
        format_elapsed(result.elapsed_seconds())
    );
    let range = session.current_batch_range();
    for review in result
        .review()
        .into_iter()
        .filter(|review| range.contains(&review.index))
    {
        let verdict = match review.outcome {
            ReviewOutcome::Correct => "correct",
            ReviewOutcome::Incorrect => "incorrect",
            ReviewOutcome::Unanswered => "unanswered",
        };
        println!(
            "{}. {} [{verdict}] answer: {}",
            review.index + 1,
            review.question.question(),
            option_label(review.question.correct_answer())
        );
        if let Some(explanation) = review.question.explanation() {
            println!("   {explanation}");
        }
    }
}

fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
