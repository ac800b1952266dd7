pub mod ids;
pub mod json_error;
pub mod jwt;
pub mod login;
pub mod plan;
pub mod product;
pub mod rating;
pub mod recipe;
pub mod server_config;
pub mod user;
pub mod validation;

pub use self::ids::{PlanId, ProductId, RecipeId, UserId};
pub use self::json_error::ErrorResponse;
pub use self::jwt::JwtClaims;
pub use self::login::{AuthResponse, Credentials};
pub use self::plan::{Plan, PlanCore, PlanRecipe};
pub use self::product::{Product, ProductCore, Serving, ServingType};
pub use self::rating::{Rating, RatingCore};
pub use self::recipe::{Recipe, RecipeCore, RecipeProduct};
pub use self::user::{PasswordChange, User};
pub use self::validation::ValidationError;
