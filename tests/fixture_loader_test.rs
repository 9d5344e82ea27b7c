use std::fs;

use chat_qa_runner::error::FixtureError;
use chat_qa_runner::models::load_fixture_file;
use tempfile::tempdir;
use tokio_test::{assert_err, assert_ok};

fn row(id: usize, question: &str, keywords: &str) -> String {
    format!(
        "[[questions]]\nid = \"{}\"\ncategory = \"Inmobiliario\"\nquestion = \"{}\"\nkeywords = \"{}\"\n\n",
        id, question, keywords
    )
}

#[tokio::test]
async fn rows_without_keywords_are_filtered() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("inmobiliario.toml");

    let mut content = String::new();
    for i in 1..=10 {
        let keywords = if i == 3 || i == 7 { "  " } else { "impuesto, vence" };
        content.push_str(&row(i, &format!("Pregunta {}", i), keywords));
    }
    fs::write(&path, content).expect("write fixtures");

    let set = assert_ok!(load_fixture_file(&path, 1000).await);

    assert_eq!(set.len(), 8);
    assert_eq!(set.dropped(), 2);
    assert_eq!(set.fixtures()[0].expected_keywords, vec!["impuesto", "vence"]);
    assert!(set.fixtures().iter().all(|f| f.id != "3" && f.id != "7"));
}

#[tokio::test]
async fn row_cap_applies_before_filtering() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("capped.toml");
    let content = [
        row(1, "Pregunta 1", ""),
        row(2, "Pregunta 2", "tasa"),
        row(3, "Pregunta 3", "tasa"),
    ]
    .concat();
    fs::write(&path, content).expect("write fixtures");

    let set = assert_ok!(load_fixture_file(&path, 2).await);

    assert_eq!(set.len(), 1);
    assert_eq!(set.fixtures()[0].id, "2");
}

#[tokio::test]
async fn numeric_cells_load_as_text() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("numeric.toml");
    fs::write(
        &path,
        "[[questions]]\nid = 1\ncategory = \"Automotor\"\nquestion = \"¿Cuánto pago?\"\nkeywords = \"cuota\"\nvalid_year = 2025\n\n\
         [[questions]]\nid = 2.5\nquestion = \"¿Hay descuento?\"\nkeywords = \"descuento\"\n",
    )
    .expect("write fixtures");

    let set = assert_ok!(load_fixture_file(&path, 10).await);

    assert_eq!(set.len(), 2);
    assert_eq!(set.fixtures()[0].id, "1");
    assert_eq!(set.fixtures()[1].id, "2.5");
    assert_eq!(set.fixtures()[1].category, "");
}

#[tokio::test]
async fn missing_and_unusable_files_are_errors() {
    let temp = tempdir().expect("tempdir");

    let missing = assert_err!(load_fixture_file(&temp.path().join("nope.toml"), 10).await);
    assert!(matches!(missing, FixtureError::ReadFailed { .. }));

    let broken = temp.path().join("broken.toml");
    fs::write(&broken, "[[questions]\nid = ").expect("write");
    assert!(matches!(
        load_fixture_file(&broken, 10).await,
        Err(FixtureError::TomlParseFailed { .. })
    ));

    let empty = temp.path().join("empty.toml");
    fs::write(&empty, row(1, "", "tasa")).expect("write");
    assert!(matches!(
        load_fixture_file(&empty, 10).await,
        Err(FixtureError::Empty { .. })
    ));
}
