// src/views/teacher.rs

use maud::{Markup, html};
use url::form_urlencoded;

use crate::{
    config::MAX_QUESTION_COUNT,
    models::{
        level::DifficultyLevel,
        question::{DraftQuestion, Question, number_questions},
        quiz::{Page, Test, TestFilter, TestSummary},
    },
    service::{
        attempt::grade_label,
        results::{ResultsQuery, ResultsReport, ResultsSort},
    },
    state::{EditDraft, TeacherSession},
    views::{Notice, layout, notice, percent},
};

const NAV: &[(&str, &str)] = &[
    ("/", "Create quiz"),
    ("/quizzes", "My quizzes"),
    ("/results", "Results"),
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn level_select(name: &str, selected: DifficultyLevel) -> Markup {
    html! {
        select name=(name) {
            @for level in DifficultyLevel::ALL {
                option value=(level.as_str()) selected[level == selected] { (level.label()) }
            }
        }
    }
}

fn draft_question(number: i32, q: &DraftQuestion) -> Markup {
    html! {
        p { strong { (number) ". " (q.question) } }
        ul {
            @for option in &q.options {
                @if *option == q.correct_answer {
                    li.correct { (option) " ✓" }
                } @else {
                    li { (option) }
                }
            }
        }
    }
}

/// Article loading, question generation and the unsaved draft.
pub fn create_page(
    session: &TeacherSession,
    default_level: DifficultyLevel,
    default_count: u32,
    error: Option<&Notice>,
) -> Markup {
    let level = session.article.as_ref().map_or(default_level, |a| a.level);
    let url = session.article.as_ref().map_or("", |a| a.url.as_str());

    layout(
        "Create quiz",
        NAV,
        html! {
            h1 { "Create a reading quiz" }
            (notice(error.or(session.notice.as_ref())))

            form.card method="post" action="/article" {
                label for="url" { "Article URL" }
                input type="url" id="url" name="url" required value=(url)
                    placeholder="https://example.com/article";
                label for="level" { "Language level" }
                (level_select("level", level))
                button type="submit" { "Load article" }
            }

            @if let Some(article) = &session.article {
                section.card {
                    h2 { (article.title) }
                    p { "Level: " (article.level.label()) " · Source: " a href=(article.url) { (article.url) } }
                    div.article.card { (article.content) }

                    form method="post" action="/quiz/generate" {
                        label for="count" { "Number of questions" }
                        input type="number" id="count" name="count" min="1"
                            max=(MAX_QUESTION_COUNT) value=(default_count);
                        button type="submit" { "Generate questions" }
                    }
                }
            }

            @if !session.draft.is_empty() {
                section.card {
                    h2 { "Draft quiz" }
                    @for numbered in number_questions(&session.draft) {
                        div.card {
                            (draft_question(numbered.order_number, numbered.draft))
                            form.inline method="post"
                                action=(format!("/quiz/questions/{}/regenerate", numbered.order_number)) {
                                button type="submit" { "Regenerate" }
                            }
                        }
                    }

                    form method="post" action="/quiz/save" {
                        label for="title" { "Quiz title (optional)" }
                        input type="text" id="title" name="title"
                            value=(session.article.as_ref().map_or("", |a| a.title.as_str()));
                        button type="submit" { "Save quiz" }
                    }
                    form.inline method="post" action="/quiz/discard" {
                        button type="submit" { "Discard draft" }
                    }
                }
            }
        },
    )
}

fn list_href(filter: &TestFilter, page: i64) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(level) = filter.level {
        query.append_pair("level", level.as_str());
    }
    if let Some(search) = filter.search_term() {
        query.append_pair("search", search);
    }
    query.append_pair("page", &page.to_string());
    format!("/quizzes?{}", query.finish())
}

/// The teacher's saved quizzes with filters and pagination.
pub fn quiz_list_page(
    page: &Page<TestSummary>,
    filter: &TestFilter,
    flash: Option<&Notice>,
) -> Markup {
    layout(
        "My quizzes",
        NAV,
        html! {
            h1 { "My quizzes" }
            (notice(flash))

            form.card method="get" action="/quizzes" {
                label for="search" { "Search by title" }
                input type="text" id="search" name="search" value=(filter.search_term().unwrap_or(""));
                label for="level" { "Level" }
                select id="level" name="level" {
                    option value="all" selected[filter.level.is_none()] { "All levels" }
                    @for level in DifficultyLevel::ALL {
                        option value=(level.as_str()) selected[filter.level == Some(level)] { (level.label()) }
                    }
                }
                button type="submit" { "Filter" }
            }

            @if page.items.is_empty() {
                p { "No quizzes found." }
            } @else {
                p { (page.total_items) " quizzes" }
                table {
                    thead {
                        tr { th { "Title" } th { "Level" } th { "Code" } th { "Questions" } th { "Created" } th {} }
                    }
                    tbody {
                        @for test in &page.items {
                            tr {
                                td { a href=(format!("/quizzes/{}", test.id)) { (test.title) } }
                                td { (test.language_level.label()) }
                                td { code { (test.access_code) } }
                                td { (test.question_count) }
                                td { (test.created_at.format(DATE_FORMAT).to_string()) }
                                td {
                                    a href=(format!("/quizzes/{}/edit", test.id)) { "Edit" }
                                    " "
                                    form.inline method="post" action=(format!("/quizzes/{}/delete", test.id)) {
                                        button type="submit" onclick="return confirm('Delete this quiz and all its results?')" { "Delete" }
                                    }
                                }
                            }
                        }
                    }
                }
                p {
                    @if page.has_previous() {
                        a href=(list_href(filter, page.page - 1)) { "← Previous" }
                        " "
                    }
                    "Page " (page.page + 1) " of " (page.total_pages())
                    @if page.has_next() {
                        " "
                        a href=(list_href(filter, page.page + 1)) { "Next →" }
                    }
                }
            }
        },
    )
}

/// A saved quiz with its access code and answer key.
pub fn quiz_detail_page(test: &Test, questions: &[Question], flash: Option<&Notice>) -> Markup {
    layout(
        &test.title,
        NAV,
        html! {
            h1 { (test.title) }
            (notice(flash))
            div.card {
                p { "Access code: " span.code { (test.access_code) } }
                p { "Level: " (test.language_level.label()) }
                p { "Created: " (test.created_at.format(DATE_FORMAT).to_string()) }
                p { "Source: " a href=(test.article_url) { (test.article_url) } }
                a href=(format!("/quizzes/{}/edit", test.id)) { "Edit" }
                " · "
                a href=(format!("/results?test_id={}", test.id)) { "Results" }
                " "
                form.inline method="post" action=(format!("/quizzes/{}/delete", test.id)) {
                    button type="submit" onclick="return confirm('Delete this quiz and all its results?')" { "Delete" }
                }
            }
            @for q in questions {
                div.card { (draft_question(q.order_number, &q.to_draft())) }
            }
            details.card {
                summary { "Article text" }
                div.article { (test.article_text) }
            }
        },
    )
}

/// Edit form for a saved quiz. Field names: `title`, `level`,
/// `question_{n}`, `option_{n}_{k}` and `correct_{n}` (the index of the correct option).
pub fn edit_page(edit: &EditDraft, error: Option<&Notice>) -> Markup {
    let action = format!("/quizzes/{}/edit", edit.test_id);
    layout(
        "Edit quiz",
        NAV,
        html! {
            h1 { "Edit quiz" }
            (notice(error))
            form method="post" action=(action) {
                div.card {
                    label for="title" { "Title" }
                    input type="text" id="title" name="title" value=(edit.title);
                    label for="level" { "Language level" }
                    (level_select("level", edit.level))
                }
                @for numbered in number_questions(&edit.questions) {
                    @let n = numbered.order_number;
                    @let q = numbered.draft;
                    div.card {
                        label for=(format!("question_{}", n)) { "Question " (n) }
                        textarea id=(format!("question_{}", n)) name=(format!("question_{}", n)) rows="2" { (q.question) }
                        @for (k, option) in q.options.iter().enumerate() {
                            label {
                                input type="radio" name=(format!("correct_{}", n)) value=(k)
                                    checked[*option == q.correct_answer];
                                " Correct · Option " (k + 1)
                            }
                            input type="text" name=(format!("option_{}_{}", n, k)) value=(option);
                        }
                        button type="submit"
                            formaction=(format!("/quizzes/{}/questions/{}/regenerate", edit.test_id, n)) {
                            "Regenerate this question"
                        }
                    }
                }
                button type="submit" { "Save changes" }
                a href=(format!("/quizzes/{}", edit.test_id)) { "Cancel" }
            }
        },
    )
}

fn sort_select(selected: ResultsSort) -> Markup {
    html! {
        select id="sort" name="sort" {
            @for sort in ResultsSort::ALL {
                option value=(sort.as_str()) selected[sort == selected] { (sort.label()) }
            }
        }
    }
}

/// Submissions across the teacher's quizzes with summary statistics.
pub fn results_page(report: &ResultsReport, query: &ResultsQuery) -> Markup {
    layout(
        "Results",
        NAV,
        html! {
            h1 { "Results" }
            form.card method="get" action="/results" {
                label for="test_id" { "Quiz" }
                select id="test_id" name="test_id" {
                    option value="" selected[query.test_id.is_none()] { "All quizzes" }
                    @for test in &report.tests {
                        option value=(test.id) selected[query.test_id == Some(test.id)] {
                            (test.title) " (" (test.access_code) ")"
                        }
                    }
                }
                label for="student" { "Student name" }
                input type="text" id="student" name="student" value=(query.student.as_deref().unwrap_or(""));
                label for="from" { "From" }
                input type="date" id="from" name="from"
                    value=(query.from.map(|d| d.to_string()).unwrap_or_default());
                label for="to" { "To" }
                input type="date" id="to" name="to"
                    value=(query.to.map(|d| d.to_string()).unwrap_or_default());
                label for="sort" { "Sort by" }
                (sort_select(query.sort))
                button type="submit" { "Apply" }
            }

            div.stats {
                div.card { h3 { "Attempts" } p { (report.stats.attempts) } }
                div.card { h3 { "Average" } p { (percent(report.stats.average_percentage)) } }
                div.card { h3 { "Pass rate" } p { (percent(report.stats.pass_rate)) } }
                div.card { h3 { "Students" } p { (report.stats.unique_students) } }
            }

            @if report.submissions.is_empty() {
                p { "No submissions yet." }
            } @else {
                table {
                    thead {
                        tr { th { "Student" } th { "Quiz" } th { "Score" } th { "Percentage" } th { "Grade" } th { "Submitted" } }
                    }
                    tbody {
                        @for s in &report.submissions {
                            tr {
                                td { (s.student_name) }
                                td { (report.test_title(s.test_id)) }
                                td { (s.score) "/" (s.total_questions) }
                                td { (percent(s.percentage)) }
                                td { (grade_label(s.percentage)) }
                                td { (s.submitted_at.format(DATE_FORMAT).to_string()) }
                            }
                            @if let Some(details) = &s.detailed_answers {
                                tr {
                                    td colspan="6" {
                                        details {
                                            summary { "Answers" }
                                            ol {
                                                @for d in details.values() {
                                                    li.correct[d.is_correct].wrong[!d.is_correct] {
                                                        (d.question_text) ": " (d.student_answer)
                                                        @if !d.is_correct {
                                                            " (correct: " (d.correct_answer) ")"
                                                        }
                                                    }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            @if !report.question_stats.is_empty() {
                h2 { "Questions" }
                table {
                    thead { tr { th { "#" } th { "Question" } th { "Correct" } th { "Rate" } } }
                    tbody {
                        @for stat in &report.question_stats {
                            tr {
                                td { (stat.order_number) }
                                td { (stat.question_text) }
                                td { (stat.correct) "/" (stat.answered) }
                                td { (percent(stat.correct_percentage())) }
                            }
                        }
                    }
                }
            }
        },
    )
}
