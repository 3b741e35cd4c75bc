use compliancehub_client::ClientError;
use compliancehub_core::{
    ChangePasswordRequest, PasswordResetConfirm, ProfileUpdate, RegisterRequest, User,
};
use serde_json::json;

use super::{prompt_line, Context};
use crate::cli::{PasswordCommands, ProfileCommands, RegisterArgs};
use crate::output::{fields, or_dash, print_done, print_one};

pub async fn login(ctx: &Context, email: &str, password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_line("Password: ")?,
    };
    let session = ctx.client.auth().login(email, &password).await?;

    let selected = session.company_id.clone();
    let summary = json!({
        "email": session.user_email,
        "company_id": selected,
        "companies": session.companies,
    });
    print_one(ctx.json, summary, |_| {
        let mut text = format!("Logged in as {}", email);
        match &selected {
            Some(id) => text.push_str(&format!("\nCompany: {}", id)),
            None if session.companies.is_empty() => {
                text.push_str("\nNo company yet. Create one with `chub company create <name>`.")
            }
            None => text.push_str("\nSeveral companies available. Pick one with `chub company use <id>`."),
        }
        text
    })
}

pub async fn logout(ctx: &Context) -> anyhow::Result<()> {
    ctx.client.auth().logout().await?;
    print_done(ctx.json, "Logged out")
}

pub async fn whoami(ctx: &Context) -> anyhow::Result<()> {
    let session = ctx
        .client
        .auth()
        .session()
        .await?
        .ok_or(ClientError::NotAuthenticated)?;
    let me = ctx.client.profile().me().await?;
    let company = ctx.client.organizations().current().await?;
    let role = company.as_ref().and_then(|c| session.role_in(c));
    let company_name = company.as_ref().and_then(|c| {
        session
            .companies
            .iter()
            .find(|a| &a.id == c)
            .map(|a| a.name.clone())
    });

    let data = json!({
        "user": me,
        "company_id": company,
        "company_name": company_name,
        "role": role,
        "credentials": session.tokens.source().to_string(),
    });
    print_one(ctx.json, data, |_| {
        fields(&[
            ("user", format!("{} <{}>", me.display_name(), me.email)),
            ("company", or_dash(company_name.clone().or(company.as_ref().map(|c| c.to_string())))),
            ("role", or_dash(role.map(|r| r.label()))),
        ])
    })
}

pub async fn register(ctx: &Context, args: RegisterArgs) -> anyhow::Result<()> {
    let (password, password_confirm) = match args.password {
        Some(p) => (p.clone(), p),
        None => (prompt_line("Password: ")?, prompt_line("Repeat password: ")?),
    };
    let username = args
        .username
        .unwrap_or_else(|| args.email.split('@').next().unwrap_or_default().to_string());
    let request = RegisterRequest {
        email: args.email,
        username,
        password,
        password_confirm,
        first_name: args.first_name,
        last_name: args.last_name,
    };
    let created = ctx.client.auth().register(&request).await?;
    print_one(ctx.json, &created, |r| {
        format!("Account created for {}. Log in with `chub login --email {}`.", r.user.email, r.user.email)
    })
}

fn render_user(user: &User) -> String {
    fields(&[
        ("name", user.display_name()),
        ("email", user.email.clone()),
        ("username", user.username.clone()),
        ("since", or_dash(user.created_at.map(|d| d.date_naive()))),
    ])
}

pub async fn profile(ctx: &Context, command: ProfileCommands) -> anyhow::Result<()> {
    match command {
        ProfileCommands::Show => {
            let me = ctx.client.profile().me().await?;
            print_one(ctx.json, me, render_user)
        }
        ProfileCommands::Update {
            first_name,
            last_name,
            email,
        } => {
            let update = ProfileUpdate {
                first_name,
                last_name,
                email,
            };
            let me = ctx.client.profile().update(&update).await?;
            print_one(ctx.json, me, render_user)
        }
    }
}

pub async fn password(ctx: &Context, command: PasswordCommands) -> anyhow::Result<()> {
    match command {
        PasswordCommands::Change => {
            let request = ChangePasswordRequest {
                old_password: prompt_line("Current password: ")?,
                new_password: prompt_line("New password: ")?,
                new_password_confirm: prompt_line("Repeat new password: ")?,
            };
            let done = ctx.client.profile().change_password(&request).await?;
            print_done(ctx.json, &done.message)
        }
        PasswordCommands::Reset { email } => {
            let requested = ctx.client.profile().request_password_reset(&email).await?;
            print_one(ctx.json, &requested, |r| match &r.reset_link {
                Some(link) => format!("{}\nReset link: {}", r.message, link),
                None => r.message.clone(),
            })
        }
        PasswordCommands::Confirm { token } => {
            let status = ctx.client.profile().validate_reset_token(&token).await?;
            if !status.valid {
                anyhow::bail!(status
                    .error
                    .unwrap_or_else(|| "Invalid or expired reset token".to_string()));
            }
            let request = PasswordResetConfirm {
                token,
                new_password: prompt_line("New password: ")?,
                new_password_confirm: prompt_line("Repeat new password: ")?,
            };
            let done = ctx.client.profile().confirm_password_reset(&request).await?;
            print_done(ctx.json, &done.message)
        }
    }
}
