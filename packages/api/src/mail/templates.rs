use super::EmailMessage;

/// Verification code mail sent to the platform contact when a user asks
/// for educator access. The admin relays the code after vetting.
pub fn educator_otp(to: &str, platform_name: &str, applicant: &str, code: &str) -> EmailMessage {
    let subject = format!("{platform_name}: educator verification code");
    let body_text = format!(
        "An educator access code was requested for {applicant}.\n\n\
         Code: {code}\n\n\
         The code expires in 10 minutes. Share it with the applicant only \
         after reviewing their request."
    );
    let body_html = format!(
        "<p>An educator access code was requested for <b>{applicant}</b>.</p>\
         <p style=\"font-size:1.4em\"><b>{code}</b></p>\
         <p>The code expires in 10 minutes. Share it with the applicant only \
         after reviewing their request.</p>"
    );
    EmailMessage {
        to: to.to_string(),
        subject,
        body_html: Some(body_html),
        body_text: Some(body_text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_mail_carries_the_code_in_both_bodies() {
        let msg = educator_otp("ops@example.com", "Lectern", "user_1", "123456");
        assert_eq!(msg.to, "ops@example.com");
        assert!(msg.body_text.as_deref().unwrap().contains("123456"));
        assert!(msg.body_html.as_deref().unwrap().contains("123456"));
    }
}
