pub mod certificate;
pub mod feedback;
pub mod grade;
pub mod otp;
pub mod parent;
pub mod student;
pub mod subject;
pub mod tutor;
pub mod tutor_grade;
pub mod tutor_subject;
pub mod user;
