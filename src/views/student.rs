// src/views/student.rs

use maud::{Markup, html};

use crate::{
    service::attempt::{AttemptResult, InProgress},
    views::{Notice, layout, notice, percent},
};

fn restart_button(label: &str) -> Markup {
    html! {
        form.inline method="post" action="/restart" {
            button type="submit" { (label) }
        }
    }
}

/// Name and access code entry.
pub fn start_page(student_name: &str, access_code: &str, error: Option<&Notice>) -> Markup {
    layout(
        "Take a test",
        &[],
        html! {
            h1 { "Reading comprehension test" }
            (notice(error))
            form.card method="post" action="/start" {
                label for="student_name" { "Your name" }
                input type="text" id="student_name" name="student_name" required value=(student_name);
                label for="access_code" { "Access code" }
                input type="text" id="access_code" name="access_code" required maxlength="5"
                    value=(access_code) placeholder="ABC12";
                button type="submit" { "Start test" }
            }
        },
    )
}

/// The open test. Radio groups are named `q_{question id}`.
pub fn test_page(progress: &InProgress, error: Option<&Notice>) -> Markup {
    layout(
        &progress.test.title,
        &[],
        html! {
            h1 { (progress.test.title) }
            p { "Student: " strong { (progress.student_name) } }
            (notice(error))
            details.card {
                summary { "Read the article" }
                div.article { (progress.test.article_text) }
            }
            form method="post" action="/submit" {
                @for q in &progress.questions {
                    @let field = format!("q_{}", q.id);
                    @let picked = progress.answers.get(&q.id);
                    fieldset.card {
                        legend { (q.order_number) ". " (q.question_text) }
                        @for option in q.options.iter() {
                            label {
                                input type="radio" name=(field) value=(option)
                                    checked[picked == Some(option)];
                                " " (option)
                            }
                        }
                    }
                }
                button type="submit" { "Submit answers" }
            }
            (restart_button("Start over"))
        },
    )
}

/// Score and per-question breakdown after submission.
pub fn result_page(result: &AttemptResult) -> Markup {
    let s = &result.submission;
    layout(
        "Your result",
        &[],
        html! {
            h1 { (result.test_title) }
            div.card {
                p { (s.student_name) ", you scored " strong { (s.score) " of " (s.total_questions) } }
                p { "Percentage: " strong { (percent(s.percentage)) } }
                p { "Grade: " strong { (result.grade()) } }
            }
            h2 { "Your answers" }
            @for d in result.details() {
                div.card {
                    p { strong { (d.order_number) ". " (d.question_text) } }
                    @if d.is_correct {
                        p.correct { "✓ " (d.student_answer) }
                    } @else {
                        p.wrong { "✗ " (d.student_answer) }
                        p { "Correct answer: " span.correct { (d.correct_answer) } }
                    }
                }
            }
            (restart_button("Take another test"))
        },
    )
}
