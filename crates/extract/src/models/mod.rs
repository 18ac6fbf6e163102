mod episode;
mod release;

pub use self::episode::EpisodeCode;
pub use self::release::Release;
