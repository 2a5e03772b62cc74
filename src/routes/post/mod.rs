mod handler;
mod model;

pub use handler::{
    count_posts, create_post, delete_post, dislike_post, get_post, like_post, list_posts,
    update_post,
};
pub use model::Reaction;
