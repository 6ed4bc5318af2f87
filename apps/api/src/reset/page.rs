use uuid::Uuid;

/// Minimal page served when a reset link is opened. Posts the new password in
/// the request body to the update endpoint.
pub fn reset_form(token_id: Uuid) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Reset password</title>
  </head>
  <body>
    <form action="/password/updatepassword/{token_id}" method="post">
      <label for="newpassword">Enter new password</label>
      <input id="newpassword" name="newpassword" type="password" required>
      <button type="submit">Reset password</button>
    </form>
  </body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_posts_to_update_endpoint() {
        let id = Uuid::new_v4();
        let html = reset_form(id);
        assert!(html.contains(&format!("action=\"/password/updatepassword/{id}\"")));
        assert!(html.contains("method=\"post\""));
        assert!(html.contains("name=\"newpassword\""));
    }
}
