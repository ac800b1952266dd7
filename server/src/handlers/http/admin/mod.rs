pub mod users;

pub use users::{handle_create_admin, handle_delete_user, handle_get_user, handle_list_users};
