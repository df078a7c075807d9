use anyhow::{Result, bail};
use std::io::{self, BufRead, IsTerminal};
use zeroize::Zeroizing;

pub const SECRET_ENV: &str = "SAILCRYPT_SECRET";

pub fn read_secret(prompt: &str) -> Result<Zeroizing<String>> {
    //  Environment Variable
    //  SAILCRYPT_SECRET="hunter2" sailcrypt encrypt
    if let Some(secret) = secret_from_env() {
        return Ok(secret);
    }

    //  stdin (Pipeline)
    //  printf "%s" "$PASSWORD" | sailcrypt encrypt
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_line(&mut buf)?;
        trim_newline(&mut buf);

        if !buf.is_empty() {
            return Ok(buf);
        }
    }

    //  Interactive (TTY)
    if io::stdin().is_terminal() {
        let secret = Zeroizing::new(rpassword::prompt_password(prompt)?);
        if !secret.is_empty() {
            return Ok(secret);
        }
    }

    bail!("No secret provided")
}

pub fn read_new_secret_with_confirmation() -> Result<Zeroizing<String>> {
    if let Some(secret) = secret_from_env() {
        return Ok(secret);
    }

    if !io::stdin().is_terminal() {
        let stdin = io::stdin();
        let mut handle = stdin.lock();

        let mut first = Zeroizing::new(String::new());
        let mut second = Zeroizing::new(String::new());

        handle.read_line(&mut first)?;
        handle.read_line(&mut second)?;

        trim_newline(&mut first);
        trim_newline(&mut second);

        return confirm(first, &second);
    }

    let first = Zeroizing::new(rpassword::prompt_password("New secret: ")?);
    let second = Zeroizing::new(rpassword::prompt_password("Confirm secret: ")?);

    confirm(first, &second)
}

fn secret_from_env() -> Option<Zeroizing<String>> {
    std::env::var(SECRET_ENV)
        .ok()
        .filter(|s| !s.is_empty())
        .map(Zeroizing::new)
}

fn confirm(first: Zeroizing<String>, second: &str) -> Result<Zeroizing<String>> {
    if first.is_empty() {
        bail!("secret cannot be empty");
    }

    if first.as_str() != second {
        bail!("secrets do not match");
    }

    Ok(first)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
