pub mod r#trait {
    pub use super::trait_::*;
}
#[path = "trait.rs"]
mod trait_;

pub use r#trait::MessageQueueRepository;

#[cfg(test)]
pub mod mock;
#[cfg(test)]
pub use mock::MockMessageQueueRepository;

#[cfg(test)]
mod tests;
