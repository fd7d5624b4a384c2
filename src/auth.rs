// Dashboard access gate. Checked locally, never sent over the network.

/// Shown in the login overlay after a wrong password.
pub const LOGIN_ERROR: &str = "密碼錯誤，請重試。";

/// Compare the entered password against the configured one.
pub fn check_password(input: &str, expected: &str) -> bool {
    input == expected
}
