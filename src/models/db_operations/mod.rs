pub mod comments_db_operations;
pub mod posts_db_operations;
pub mod users_db_operations;
