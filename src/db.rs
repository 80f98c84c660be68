use sqlx::MySqlPool;
use tracing::info;

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPool::connect(database_url).await?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Creates the attendance table when it does not exist yet.
///
/// `seq` only breaks ties between rows created within the same second.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance_records (
            seq BIGINT UNSIGNED NOT NULL AUTO_INCREMENT,
            id CHAR(36) NOT NULL,
            name VARCHAR(255) NOT NULL,
            time VARCHAR(16) NOT NULL,
            date VARCHAR(16) NOT NULL,
            location VARCHAR(255) NOT NULL,
            status VARCHAR(16) NOT NULL,
            face_image MEDIUMTEXT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (seq),
            UNIQUE KEY uq_attendance_records_id (id),
            KEY idx_attendance_records_created_at (created_at)
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Attendance schema ready");
    Ok(())
}
