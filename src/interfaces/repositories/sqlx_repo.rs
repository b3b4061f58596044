use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxAssetRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxSnapshotRepo {
    pub pool: PgPool,
}
