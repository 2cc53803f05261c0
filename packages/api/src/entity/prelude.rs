pub use super::chapter::Entity as Chapter;
pub use super::course::Entity as Course;
pub use super::course_rating::Entity as CourseRating;
pub use super::educator_request::Entity as EducatorRequest;
pub use super::enrollment::Entity as Enrollment;
pub use super::lecture::Entity as Lecture;
pub use super::lecture_progress::Entity as LectureProgress;
pub use super::payment_event::Entity as PaymentEvent;
pub use super::purchase::Entity as Purchase;
pub use super::user::Entity as User;
