pub mod edit;
pub mod error;
pub mod id;
pub mod skill;
pub mod tags;

// Re-export commonly used types
pub use error::TreeError;
pub use id::{SkillId, TreeId};
pub use skill::{Skill, SkillTree, UserProgress};
