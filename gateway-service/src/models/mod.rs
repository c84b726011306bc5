pub mod audit;
pub mod facility;
pub mod facility_ids;
pub mod identity;
pub mod permission;
pub mod role;
pub mod session;
pub mod user;

pub use audit::{RejectionReason, SignInRejection};
pub use facility::{Facility, FacilityFilter, NewFacility, STATUS_ACTIVE};
pub use facility_ids::FacilityIds;
pub use identity::{IdentityAssertion, ProviderCallback};
pub use permission::{contains_all, Permission, PermissionSet};
pub use role::Role;
pub use session::{IssuedSession, SessionRecord, SessionSnapshot, SessionView};
pub use user::{NewUser, User, UserResponse, UserUpdate};
