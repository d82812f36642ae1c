// tests/teacher_flow.rs

mod common;

use common::{TEACHER_ID, browser, seed_test, spawn_apps};
use quizmaker::{
    models::{level::DifficultyLevel, quiz::TestFilter},
    store::QuizStore,
};

#[tokio::test]
async fn health_check_works() {
    let app = spawn_apps().await;
    let client = reqwest::Client::new();

    for base in [&app.teacher, &app.student] {
        let response = client
            .get(format!("{}/health", base))
            .send()
            .await
            .expect("Failed to execute request.");
        assert!(response.status().is_success());
        assert_eq!(response.text().await.unwrap(), "ok");
    }
}

#[tokio::test]
async fn article_to_saved_quiz() {
    let app = spawn_apps().await;
    let client = browser();

    // 1. Load the article
    let page = client
        .post(format!("{}/article", app.teacher))
        .form(&[
            ("url", format!("{}/article", app.articles)),
            ("level", "original".to_string()),
        ])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Article loaded: Rivers of Europe"), "{}", page);

    // Boilerplate never reaches the model
    let prompts = app.ai.prompts();
    let cleaning_prompt = &prompts[0];
    assert!(cleaning_prompt.contains("The Danube flows east & the Rhine flows north."));
    assert!(!cleaning_prompt.contains("pixel"));
    assert!(!cleaning_prompt.contains("Copyright"));
    assert!(!cleaning_prompt.contains("Weather"));

    // 2. Generate five questions
    let page = client
        .post(format!("{}/quiz/generate", app.teacher))
        .form(&[("count", "5")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Generated 5 questions."));
    assert!(page.contains("Question 5 about rivers?"));

    // 3. Replace the second question
    let page = client
        .post(format!("{}/quiz/questions/2/regenerate", app.teacher))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Fresh question about rivers?"));
    assert!(!page.contains("Question 2 about rivers?"));

    // 4. Save
    let response = client
        .post(format!("{}/quiz/save", app.teacher))
        .form(&[("title", "River quiz")])
        .send()
        .await
        .unwrap();
    assert!(response.url().path().starts_with("/quizzes/"));
    let page = response.text().await.unwrap();
    assert!(page.contains("Quiz saved! Access code:"));

    let listed = app
        .store
        .list_tests(TEACHER_ID, &TestFilter::default(), 10)
        .await
        .unwrap();
    assert_eq!(listed.total_items, 1);
    let saved = &listed.items[0];
    assert_eq!(saved.title, "River quiz");
    assert_eq!(saved.question_count, 5);
    assert_eq!(saved.access_code.len(), 5);
    assert!(page.contains(&saved.access_code));

    let questions = app.store.questions_for(saved.id).await.unwrap();
    let ordinals: Vec<i32> = questions.iter().map(|q| q.order_number).collect();
    assert_eq!(ordinals, vec![1, 2, 3, 4, 5]);
    assert_eq!(questions[1].question_text, "Fresh question about rivers?");

    // The draft is cleared after saving
    let page = client.get(&app.teacher).send().await.unwrap().text().await.unwrap();
    assert!(!page.contains("Draft quiz"));
}

#[tokio::test]
async fn adapted_article_keeps_its_level() {
    let app = spawn_apps().await;
    let client = browser();

    client
        .post(format!("{}/article", app.teacher))
        .form(&[
            ("url", format!("{}/article", app.articles)),
            ("level", "B1".to_string()),
        ])
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/quiz/generate", app.teacher))
        .form(&[("count", "2")])
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/quiz/save", app.teacher))
        .form(&[("title", "")])
        .send()
        .await
        .unwrap();

    let prompts = app.ai.prompts();
    assert!(prompts.iter().any(|p| p.starts_with("Adapt this text to B1 level")));

    let listed = app
        .store
        .list_tests(TEACHER_ID, &TestFilter::default(), 10)
        .await
        .unwrap();
    assert_eq!(listed.items[0].language_level, DifficultyLevel::B1);
    // Blank title falls back to the start of the article text
    assert_eq!(listed.items[0].title, "# Rivers of Europe\n\nThe Danube...");
}

#[tokio::test]
async fn ingestion_errors_are_shown_on_the_page() {
    let app = spawn_apps().await;
    let client = browser();

    for path in ["/data.json", "/empty", "/missing"] {
        let page = client
            .post(format!("{}/article", app.teacher))
            .form(&[
                ("url", format!("{}{}", app.articles, path)),
                ("level", "original".to_string()),
            ])
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(page.contains("Could not load the article"), "{}: {}", path, page);
    }
    assert!(app.ai.prompts().is_empty());

    let page = client
        .post(format!("{}/article", app.teacher))
        .form(&[("url", "not a url"), ("level", "original")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Please enter a valid article URL."));
}

#[tokio::test]
async fn generating_without_article_is_rejected() {
    let app = spawn_apps().await;
    let client = browser();

    let page = client
        .post(format!("{}/quiz/generate", app.teacher))
        .form(&[("count", "3")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Load an article first."));

    let page = client
        .post(format!("{}/quiz/save", app.teacher))
        .form(&[("title", "x")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Load an article first."));
    assert_eq!(app.store.question_count().await, 0);
}

#[tokio::test]
async fn quiz_list_filters_and_unknown_quiz() {
    let app = spawn_apps().await;
    let client = browser();
    seed_test(&app.store, "AAAA1", 2).await;

    let page = client
        .get(format!("{}/quizzes", app.teacher))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Rivers of Europe"));
    assert!(page.contains("AAAA1"));

    let page = client
        .get(format!("{}/quizzes?search=volcano&level=all", app.teacher))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("No quizzes found."));

    let response = client
        .get(format!("{}/quizzes/9999", app.teacher))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    assert!(response.text().await.unwrap().contains("Test not found"));
}

#[tokio::test]
async fn edit_replaces_questions() {
    let app = spawn_apps().await;
    let client = browser();
    let test = seed_test(&app.store, "EDIT1", 3).await;

    let page = client
        .get(format!("{}/quizzes/{}/edit", app.teacher, test.id))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Edit quiz"));
    assert!(page.contains("question_3"));

    let page = client
        .post(format!("{}/quizzes/{}/edit", app.teacher, test.id))
        .form(&[
            ("title", "Renamed quiz"),
            ("level", "B2"),
            ("question_1", "Which sea does the Danube reach?"),
            ("option_1_0", "North Sea"),
            ("option_1_1", "Baltic Sea"),
            ("option_1_2", "Black Sea"),
            ("option_1_3", "Red Sea"),
            ("correct_1", "2"),
        ])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Changes saved."), "{}", page);

    let stored = app.store.get_test(test.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Renamed quiz");
    assert_eq!(stored.language_level, DifficultyLevel::B2);
    assert_eq!(stored.access_code, "EDIT1");

    let questions = app.store.questions_for(test.id).await.unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].order_number, 1);
    assert_eq!(questions[0].correct_answer, "Black Sea");
}

#[tokio::test]
async fn edit_without_correct_answer_is_rejected() {
    let app = spawn_apps().await;
    let client = browser();
    let test = seed_test(&app.store, "EDIT2", 2).await;

    let page = client
        .post(format!("{}/quizzes/{}/edit", app.teacher, test.id))
        .form(&[
            ("title", "Broken"),
            ("level", "original"),
            ("question_1", "Q?"),
            ("option_1_0", "a"),
            ("option_1_1", "b"),
        ])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("must mark one of its options as correct"));
    assert_eq!(app.store.questions_for(test.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn delete_removes_quiz_and_questions() {
    let app = spawn_apps().await;
    let client = browser();
    let test = seed_test(&app.store, "DEL01", 4).await;

    let page = client
        .post(format!("{}/quizzes/{}/delete", app.teacher, test.id))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Quiz deleted."));
    assert!(app.store.get_test(test.id).await.unwrap().is_none());
    assert_eq!(app.store.question_count().await, 0);
}

#[tokio::test]
async fn huge_page_number_is_clamped() {
    let app = spawn_apps().await;
    let client = browser();
    seed_test(&app.store, "PAGE1", 1).await;

    for page in ["9223372036854775807", "-9223372036854775808"] {
        let response = client
            .get(format!("{}/quizzes?page={}", app.teacher, page))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200, "page={}", page);
        let body = response.text().await.unwrap();
        assert!(!body.contains("Next"), "page={}", page);
    }
}
