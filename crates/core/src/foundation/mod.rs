pub mod traits;

pub use traits::Initializable;
