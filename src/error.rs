use crate::render::buffer::BufferCategory;

#[derive(Debug)]
pub enum Error {
    Message(String),
    ArenaCapacityExceeded {
        category: BufferCategory,
        requested: u64,
        capacity: u64,
    },
    MissingFeatures(wgpu::Features),
}

impl Error {
    pub fn new(message: String) -> Self {
        Self::Message(message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Message(message) => write!(f, "{}", message),
            Error::ArenaCapacityExceeded {
                category,
                requested,
                capacity,
            } => write!(
                f,
                "The {category} arena cannot hold {requested} elements (capacity: {capacity})"
            ),
            Error::MissingFeatures(features) => write!(
                f,
                "The adapter does not support the required features: {features:?}"
            ),
        }
    }
}

impl std::error::Error for Error {}
