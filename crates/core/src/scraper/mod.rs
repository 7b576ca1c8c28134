//! Page scrapers for evaluation and speaker data.

pub mod scripts;
pub mod session;
pub mod speaker;
pub mod text;

pub use session::{
	AppliedRating, SessionSummary, extract_session_details, extract_session_id, get_session_list, navigate_to_session,
	parse_ratings, save_and_continue, set_comment, set_ratings,
};
pub use speaker::{SpeakerRecord, SpeakerSession, get_speaker_sessions, search_speakers};
pub use text::{PageSnapshot, ReviewStatus, SessionRecord, SpeakerName};
