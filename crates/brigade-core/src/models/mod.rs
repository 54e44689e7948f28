pub mod achievement;
pub mod attributes;
pub mod profile;

pub use achievement::Achievement;
pub use attributes::{Attribute, AttributeProgress, AttributeSet};
pub use profile::{Milestones, RankStanding, UserProfile, MAX_RECENT_ACHIEVEMENTS};
