use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::notes::{NoteBook, StudentNote};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn save_note(pool: &PgPool, student: &str, text: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO classroom_pathways.student_notes (id, student_name, note)
        VALUES ($1, $2, $3)
        ON CONFLICT (student_name) DO UPDATE
        SET note = EXCLUDED.note, updated_at = now()
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student)
    .bind(text)
    .execute(pool)
    .await?;

    tracing::debug!(student, "saved note");
    Ok(())
}

pub async fn delete_note(pool: &PgPool, student: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM classroom_pathways.student_notes WHERE student_name = $1")
        .bind(student)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_notes(pool: &PgPool) -> anyhow::Result<NoteBook> {
    let rows = sqlx::query(
        "SELECT student_name, note, updated_at \
         FROM classroom_pathways.student_notes \
         ORDER BY created_at, student_name",
    )
    .fetch_all(pool)
    .await?;

    let mut notes = Vec::new();
    for row in rows {
        let updated_at: DateTime<Utc> = row.get("updated_at");
        notes.push(StudentNote {
            student: row.get("student_name"),
            text: row.get("note"),
            updated_at,
        });
    }

    Ok(notes.into_iter().collect())
}
