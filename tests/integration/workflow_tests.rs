//! Service-level workflows: create, redisplay, guarded delete

use folio_server::{
    error::AppError,
    models::{
        author::AuthorForm,
        book::BookForm,
        book_instance::BookInstanceForm,
        genre::GenreForm,
    },
    repository::Repository,
    services::{
        authors::AUTHORS_URL, books::BOOKS_URL, genres::GENRES_URL,
        validation::RelationInput, Removal, Services, Submission,
    },
};
use uuid::Uuid;

fn catalog() -> Services {
    Services::new(Repository::in_memory())
}

/// Id at the end of a canonical URL
fn saved_id<C: std::fmt::Debug>(outcome: Submission<C>) -> Uuid {
    match outcome {
        Submission::Saved { url } => {
            let raw = url.rsplit('/').next().expect("URL has no id segment");
            Uuid::parse_str(raw).expect("URL does not end in an id")
        }
        Submission::Invalid(page) => panic!("expected Saved, got {:?}", page),
    }
}

async fn create_austen(services: &Services) -> Uuid {
    let outcome = services
        .authors
        .create(AuthorForm {
            first_name: "Jane".into(),
            family_name: "Austen".into(),
            ..Default::default()
        })
        .await
        .expect("author create failed");
    saved_id(outcome)
}

async fn create_genre(services: &Services, name: &str) -> Uuid {
    let outcome = services
        .genres
        .create(GenreForm { name: name.into() })
        .await
        .expect("genre create failed");
    saved_id(outcome)
}

fn book_form(author: Uuid, genre: Option<RelationInput>) -> BookForm {
    BookForm {
        title: "Emma".into(),
        author: author.to_string(),
        summary: "Matchmaking in Highbury".into(),
        isbn: "9780141439587".into(),
        genre,
    }
}

fn instance_form(book: Uuid, status: &str, due_back: Option<&str>) -> BookInstanceForm {
    BookInstanceForm {
        book: book.to_string(),
        imprint: "Penguin Classics, 2003".into(),
        status: status.into(),
        due_back: due_back.map(String::from),
    }
}

#[tokio::test]
async fn test_author_without_dates_end_to_end() {
    let services = catalog();
    let id = create_austen(&services).await;

    let detail = services.authors.detail(id).await.unwrap();
    assert_eq!(detail.title, "Austen, Jane");
    assert_eq!(detail.author.name, "Austen, Jane");
    assert_eq!(detail.author.lifespan, " - ");
    assert_eq!(detail.author.url, format!("/catalog/author/{}", id));
    assert!(detail.books.is_empty());

    let list = services.authors.list().await.unwrap();
    assert_eq!(list.author_list.len(), 1);
}

#[tokio::test]
async fn test_invalid_author_is_redisplayed_with_input() {
    let services = catalog();
    let outcome = services
        .authors
        .create(AuthorForm {
            first_name: "  Jane!  ".into(),
            family_name: "Austen".into(),
            date_of_birth: Some("not a date".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    match outcome {
        Submission::Invalid(page) => {
            let fields: Vec<_> = page.errors.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["first_name", "date_of_birth"]);
            assert_eq!(page.author.unwrap().first_name, "Jane!");
        }
        Submission::Saved { url } => panic!("unexpected save to {}", url),
    }
    assert!(services.authors.list().await.unwrap().author_list.is_empty());
}

#[tokio::test]
async fn test_author_delete_blocked_by_books() {
    let services = catalog();
    let author = create_austen(&services).await;
    let emma = saved_id(services.books.create(book_form(author, None)).await.unwrap());

    match services.authors.delete(author).await.unwrap() {
        Removal::Blocked(page) => {
            let ids: Vec<_> = page.author_books.iter().map(|b| b.record.id).collect();
            assert_eq!(ids, vec![emma]);
        }
        Removal::Removed { .. } => panic!("author with books must not be deleted"),
    }
    assert!(services.authors.detail(author).await.is_ok());

    // Once the book is gone the author goes too, and deleting again is a no-op
    assert_eq!(
        services.books.delete(emma).await.unwrap(),
        Removal::Removed { url: BOOKS_URL.to_string() }
    );
    for _ in 0..2 {
        assert_eq!(
            services.authors.delete(author).await.unwrap(),
            Removal::Removed { url: AUTHORS_URL.to_string() }
        );
    }
    assert!(matches!(
        services.authors.detail(author).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_genre_create_reuses_existing_name() {
    let services = catalog();
    let first = create_genre(&services, "Fantasy").await;
    let second = create_genre(&services, "  Fantasy ").await;

    assert_eq!(first, second);
    assert_eq!(services.genres.list().await.unwrap().genre_list.len(), 1);
}

#[tokio::test]
async fn test_genre_delete_blocked_then_allowed() {
    let services = catalog();
    let author = create_austen(&services).await;
    let romance = create_genre(&services, "Romance").await;
    let emma = saved_id(
        services
            .books
            .create(book_form(author, Some(RelationInput::One(romance.to_string()))))
            .await
            .unwrap(),
    );

    assert!(matches!(
        services.genres.delete(romance).await.unwrap(),
        Removal::Blocked(page) if page.genre_books.len() == 1
    ));

    services.books.delete(emma).await.unwrap();
    assert_eq!(
        services.genres.delete(romance).await.unwrap(),
        Removal::Removed { url: GENRES_URL.to_string() }
    );
}

#[tokio::test]
async fn test_book_genres_accept_single_or_list() {
    let services = catalog();
    let author = create_austen(&services).await;
    let romance = create_genre(&services, "Romance").await;
    let satire = create_genre(&services, "Satire").await;

    let single = saved_id(
        services
            .books
            .create(book_form(author, Some(RelationInput::One(romance.to_string()))))
            .await
            .unwrap(),
    );
    let many = saved_id(
        services
            .books
            .create(book_form(
                author,
                Some(RelationInput::Many(vec![
                    satire.to_string(),
                    romance.to_string(),
                    satire.to_string(),
                ])),
            ))
            .await
            .unwrap(),
    );

    let single = services.books.detail(single).await.unwrap();
    assert_eq!(single.book.record.genre_ids, vec![romance]);

    let many = services.books.detail(many).await.unwrap();
    assert_eq!(many.book.record.genre_ids, vec![satire, romance]);
    assert_eq!(many.genres.len(), 2);
    assert_eq!(many.author.unwrap().name, "Austen, Jane");
}

#[tokio::test]
async fn test_book_with_unknown_author_is_not_saved() {
    let services = catalog();
    let fantasy = create_genre(&services, "Fantasy").await;
    let outcome = services
        .books
        .create(book_form(
            Uuid::new_v4(),
            Some(RelationInput::One(fantasy.to_string())),
        ))
        .await
        .unwrap();

    match outcome {
        Submission::Invalid(page) => {
            assert_eq!(page.errors.len(), 1);
            assert_eq!(page.errors[0].field, "author");
            // Submitted genre stays checked on redisplay
            assert_eq!(page.genres.len(), 1);
            assert!(page.genres[0].checked);
        }
        Submission::Saved { url } => panic!("unexpected save to {}", url),
    }
    assert!(services.books.list().await.unwrap().book_list.is_empty());
}

#[tokio::test]
async fn test_book_edit_form_checks_current_genres() {
    let services = catalog();
    let author = create_austen(&services).await;
    let romance = create_genre(&services, "Romance").await;
    create_genre(&services, "Horror").await;
    let emma = saved_id(
        services
            .books
            .create(book_form(author, Some(RelationInput::One(romance.to_string()))))
            .await
            .unwrap(),
    );

    let page = services.books.edit_form(emma).await.unwrap();
    let checked: Vec<_> = page
        .genres
        .iter()
        .map(|option| (option.genre.name.as_str(), option.checked))
        .collect();
    assert_eq!(checked, vec![("Horror", false), ("Romance", true)]);
    assert_eq!(page.book.unwrap().title, "Emma");
}

#[tokio::test]
async fn test_loaned_copy_needs_due_date() {
    let services = catalog();
    let author = create_austen(&services).await;
    let emma = saved_id(services.books.create(book_form(author, None)).await.unwrap());

    match services
        .book_instances
        .create(instance_form(emma, "Loaned", None))
        .await
        .unwrap()
    {
        Submission::Invalid(page) => {
            assert_eq!(page.errors.len(), 1);
            assert_eq!(page.errors[0].field, "due_back");
        }
        Submission::Saved { url } => panic!("unexpected save to {}", url),
    }

    let available = saved_id(
        services
            .book_instances
            .create(instance_form(emma, "Available", None))
            .await
            .unwrap(),
    );
    let loaned = saved_id(
        services
            .book_instances
            .create(instance_form(emma, "Loaned", Some("2026-11-01")))
            .await
            .unwrap(),
    );

    let detail = services.book_instances.detail(loaned).await.unwrap();
    assert_eq!(detail.due_back_formatted, "2026-11-01");
    assert_eq!(detail.title, "Copy: Emma");

    match services.books.delete(emma).await.unwrap() {
        Removal::Blocked(page) => {
            let ids: Vec<_> = page.book_instances.iter().map(|i| i.record.id).collect();
            assert_eq!(ids, vec![available, loaned]);
        }
        Removal::Removed { .. } => panic!("book with copies must not be deleted"),
    }
}

#[tokio::test]
async fn test_updates_of_missing_records_are_not_found() {
    let services = catalog();
    let missing = Uuid::new_v4();

    assert!(matches!(
        services.genres.update(missing, GenreForm { name: "Poetry".into() }).await,
        Err(AppError::NotFound(_))
    ));
    // Existence is checked before the submission is validated
    assert!(matches!(
        services
            .book_instances
            .update(missing, BookInstanceForm::default())
            .await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_home_counts_reflect_catalog() {
    let services = catalog();
    let author = create_austen(&services).await;
    create_genre(&services, "Romance").await;
    let emma = saved_id(services.books.create(book_form(author, None)).await.unwrap());
    services
        .book_instances
        .create(instance_form(emma, "Available", None))
        .await
        .unwrap();
    services
        .book_instances
        .create(instance_form(emma, "Maintenance", Some("2026-12-24")))
        .await
        .unwrap();

    let home = services.catalog.summary().await.unwrap();
    assert_eq!(home.title, "Local Library Home");
    assert_eq!(home.data.author_count, 1);
    assert_eq!(home.data.genre_count, 1);
    assert_eq!(home.data.book_count, 1);
    assert_eq!(home.data.book_instance_count, 2);
    assert_eq!(home.data.book_instance_available_count, 1);
}

#[tokio::test]
async fn test_author_update_replaces_record_in_place() {
    let services = catalog();
    let id = create_austen(&services).await;

    let outcome = services
        .authors
        .update(
            id,
            AuthorForm {
                first_name: "Jane".into(),
                family_name: "Austen".into(),
                date_of_birth: Some("1775-12-16T00:00:00".into()),
                date_of_death: Some("1817-07-18".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(
        outcome,
        Submission::Saved { url: format!("/catalog/author/{}", id) }
    );

    let detail = services.authors.detail(id).await.unwrap();
    assert_eq!(detail.author.author.id, id);
    assert_eq!(detail.author.lifespan, "1775-12-16 - 1817-07-18");
    assert_eq!(services.authors.list().await.unwrap().author_list.len(), 1);
}

#[tokio::test]
async fn test_book_update_moves_genres_and_remarks_form() {
    let services = catalog();
    let author = create_austen(&services).await;
    let romance = create_genre(&services, "Romance").await;
    let satire = create_genre(&services, "Satire").await;
    let emma = saved_id(
        services
            .books
            .create(book_form(author, Some(RelationInput::One(romance.to_string()))))
            .await
            .unwrap(),
    );

    let mut form = book_form(author, Some(RelationInput::Many(vec![satire.to_string()])));
    form.title = "Persuasion".into();
    let outcome = services.books.update(emma, form).await.unwrap();
    assert_eq!(
        outcome,
        Submission::Saved { url: format!("/catalog/book/{}", emma) }
    );

    let detail = services.books.detail(emma).await.unwrap();
    assert_eq!(detail.book.record.id, emma);
    assert_eq!(detail.book.record.title, "Persuasion");
    assert_eq!(detail.book.record.genre_ids, vec![satire]);

    let page = services.books.edit_form(emma).await.unwrap();
    let checked: Vec<_> = page
        .genres
        .iter()
        .map(|option| (option.genre.name.as_str(), option.checked))
        .collect();
    assert_eq!(checked, vec![("Romance", false), ("Satire", true)]);

    // Romance is no longer referenced, so it can go
    assert_eq!(
        services.genres.delete(romance).await.unwrap(),
        Removal::Removed { url: GENRES_URL.to_string() }
    );
    assert_eq!(services.books.list().await.unwrap().book_list.len(), 1);
}

#[tokio::test]
async fn test_book_genre_spellings_store_one_id() {
    let services = catalog();
    let author = create_austen(&services).await;
    let romance = create_genre(&services, "Romance").await;
    let lower = romance.to_string();

    let emma = saved_id(
        services
            .books
            .create(book_form(
                author,
                Some(RelationInput::Many(vec![
                    lower.clone(),
                    lower.to_uppercase(),
                    format!(" {} ", lower),
                ])),
            ))
            .await
            .unwrap(),
    );

    let detail = services.books.detail(emma).await.unwrap();
    assert_eq!(detail.book.record.genre_ids, vec![romance]);
}
