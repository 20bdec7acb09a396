pub mod comment;
pub mod ids;
pub mod node;
pub mod notification;

pub use comment::*;
pub use ids::*;
pub use node::*;
pub use notification::*;
