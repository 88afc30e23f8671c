use hirely_application::ApplicantNotification;
use hirely_domain::SubmissionStatus;

/// Rendered plain-text message for an applicant notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RenderedNotification {
    pub(crate) subject: String,
    pub(crate) body: String,
}

pub(crate) fn render(notification: &ApplicantNotification) -> RenderedNotification {
    let greeting = match notification.full_name() {
        name if name.is_empty() => "Hello,".to_owned(),
        name => format!("Hello {name},"),
    };

    let (subject, message) = match notification.status {
        None => (
            "We received your application",
            "Thank you for applying. Our team will review your application and get back to you.",
        ),
        Some(SubmissionStatus::New) | Some(SubmissionStatus::Reviewed) => (
            "Your application is being reviewed",
            "Our team has started reviewing your application.",
        ),
        Some(SubmissionStatus::Shortlisted) => (
            "You have been shortlisted",
            "Good news: your application has been shortlisted. We will contact you about next steps.",
        ),
        Some(SubmissionStatus::Accepted) => (
            "Your application has been accepted",
            "Congratulations, your application has been accepted.",
        ),
        Some(SubmissionStatus::Rejected) => (
            "Update on your application",
            "Thank you for your interest. We will not be moving forward with your application.",
        ),
    };

    let mut body = format!("{greeting}\n\n{message}\n");
    if let Some(notes) = notification.notes.as_deref() {
        body.push_str(format!("\nNote from the team:\n{notes}\n").as_str());
    }

    RenderedNotification {
        subject: subject.to_owned(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use hirely_application::ApplicantNotification;
    use hirely_domain::{ApplicantContact, SubmissionStatus};

    use super::render;

    fn contact() -> ApplicantContact {
        ApplicantContact {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
        }
    }

    #[test]
    fn confirmation_greets_the_applicant() {
        let rendered = render(&ApplicantNotification::confirmation(contact()));
        assert_eq!(rendered.subject, "We received your application");
        assert!(rendered.body.starts_with("Hello Ada Lovelace,"));
    }

    #[test]
    fn status_update_includes_reviewer_note() {
        let rendered = render(&ApplicantNotification::status_update(
            contact(),
            SubmissionStatus::Shortlisted,
            Some("Interview next week".to_owned()),
        ));
        assert_eq!(rendered.subject, "You have been shortlisted");
        assert!(rendered.body.contains("Interview next week"));
    }
}
