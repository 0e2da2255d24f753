#![windows_subsystem = "windows"]
slint::include_modules!();

use std::rc::Rc;

use profile_explorer::card::{CardView, ProfileView};
use profile_explorer::client::{self, GitHubClient};
use profile_explorer::models::Suggestion;
use profile_explorer::{Config, Explorer, ExplorerState};
use slint::{Model, ModelRc, SharedString, VecModel};
use tokio::sync::watch;

/// Decoded RGBA pixels with their width and height.
type Pixels = (Vec<u8>, u32, u32);

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Environment first, then `.env` overrides
    let config = Config::from_env()?;

    // One HTTP client for API calls and avatar downloads
    let http_client = client::build_client(config.request_timeout)?;
    let api = GitHubClient::new(http_client.clone(), config.api_url.clone());

    // Background tokio runtime for async HTTP. Entering it on the UI thread
    // lets callbacks spawn tasks directly.
    let rt = tokio::runtime::Runtime::new()?;
    let _rt_guard = rt.enter();

    // Create the UI
    let app = AppWindow::new()?;
    let explorer = Explorer::new(api, &config);

    // =============================================
    //  STATE → UI
    // =============================================
    rt.spawn(sync_state(explorer.subscribe(), app.as_weak(), http_client));

    // =============================================
    //  CALLBACK: query-edited (search box)
    // =============================================
    {
        let explorer = explorer.clone();
        app.on_query_edited(move |query| {
            explorer.set_query(query.as_str());
        });
    }

    // =============================================
    //  CALLBACK: suggestion-selected
    // =============================================
    {
        let explorer = explorer.clone();
        let app_weak = app.as_weak();

        app.on_suggestion_selected(move |index| {
            let Some(app) = app_weak.upgrade() else { return };
            let Some(item) = app.get_suggestions().row_data(index as usize) else {
                return;
            };

            app.set_search_query(SharedString::default());
            explorer.select(item.login.as_str());
        });
    }

    // =============================================
    //  CALLBACK: link-clicked (repository / homepage)
    // =============================================
    app.on_link_clicked(|url| {
        // Open the raw URL in the native Web Browser
        if let Err(e) = open::that(url.as_str()) {
            log::warn!("Could not open {url}: {e}");
        }
    });

    // Load the default subject on startup
    explorer.start();

    // Run the Slint event loop
    app.run()?;

    Ok(())
}

/// Pushes every state change onto the Slint event loop as soon as it arrives.
/// Avatars are fetched by separate tasks and land whenever they are ready.
async fn sync_state(
    mut rx: watch::Receiver<ExplorerState>,
    app_weak: slint::Weak<AppWindow>,
    http_client: reqwest::Client,
) {
    let mut shown_avatar: Option<String> = None;
    let mut shown_suggestions: Vec<String> = Vec::new();

    loop {
        let state = rx.borrow_and_update().clone();
        let header = ProfileView::new(state.profile.as_ref());
        let cards: Vec<CardView> = state.cards.iter().map(CardView::from_card).collect();

        // Outer `None` leaves the current image untouched.
        let avatar = (header.avatar_url != shown_avatar).then(|| {
            shown_avatar = header.avatar_url.clone();
            shown_avatar.clone()
        });

        let logins: Vec<String> = state.suggestions.iter().map(|s| s.login.clone()).collect();
        let suggestions = (logins != shown_suggestions).then(|| {
            shown_suggestions = logins;
            state.suggestions.clone()
        });

        let weak = app_weak.clone();
        let avatar_url = avatar.clone();
        let suggestion_rows = suggestions.clone();
        let loading = state.loading;
        let error = state.error.unwrap_or_default();
        let pushed = slint::invoke_from_event_loop(move || {
            let Some(app) = weak.upgrade() else { return };

            app.set_display_name(header.title.into());
            app.set_bio(header.bio.unwrap_or_default().into());
            app.set_location(header.location.unwrap_or_default().into());
            app.set_email(header.email.unwrap_or_default().into());
            app.set_social(header.social.into());
            app.set_repos_heading(header.repositories_heading.into());

            if let Some(url) = avatar_url {
                app.set_avatar_url(url.unwrap_or_default().into());
                app.set_has_avatar(false);
            }

            if let Some(items) = suggestion_rows {
                let model: Vec<SuggestionItem> = items
                    .into_iter()
                    .map(|suggestion| SuggestionItem {
                        login: suggestion.login.into(),
                        name: suggestion.name.unwrap_or_default().into(),
                        avatar: slint::Image::default(),
                    })
                    .collect();
                app.set_suggestions(ModelRc::from(Rc::new(VecModel::from(model))));
            }

            let repos: Vec<RepoItem> = cards.into_iter().map(repo_item).collect();
            app.set_repo_list(ModelRc::from(Rc::new(VecModel::from(repos))));
            app.set_error_message(error.into());
            app.set_is_loading(loading);
        });

        if pushed.is_err() {
            // Event loop is gone.
            break;
        }

        if let Some(Some(url)) = avatar {
            tokio::spawn(load_avatar(http_client.clone(), app_weak.clone(), url));
        }
        if let Some(items) = suggestions {
            load_suggestion_avatars(&http_client, &app_weak, items);
        }

        if rx.changed().await.is_err() {
            break;
        }
    }
}

/// Downloads the profile avatar and shows it if `url` is still the current one.
async fn load_avatar(client: reqwest::Client, app_weak: slint::Weak<AppWindow>, url: String) {
    let Some(pixels) = download_avatar_pixels(&client, url.clone(), 128).await else {
        return;
    };

    let _ = slint::invoke_from_event_loop(move || {
        let Some(app) = app_weak.upgrade() else { return };
        if app.get_avatar_url().as_str() != url {
            return;
        }
        app.set_avatar(to_image(pixels));
        app.set_has_avatar(true);
    });
}

/// Spawns one download per suggestion. Each thumbnail goes into its row only
/// while that row still shows the same login.
fn load_suggestion_avatars(
    client: &reqwest::Client,
    app_weak: &slint::Weak<AppWindow>,
    suggestions: Vec<Suggestion>,
) {
    for (row, suggestion) in suggestions.into_iter().enumerate() {
        let client = client.clone();
        let app_weak = app_weak.clone();

        tokio::spawn(async move {
            let Some(pixels) = download_avatar_pixels(&client, suggestion.avatar_url, 64).await
            else {
                return;
            };
            let login = suggestion.login;

            let _ = slint::invoke_from_event_loop(move || {
                let Some(app) = app_weak.upgrade() else { return };
                let model = app.get_suggestions();
                let Some(mut item) = model.row_data(row) else { return };
                if item.login.as_str() != login {
                    return;
                }
                item.avatar = to_image(pixels);
                model.set_row_data(row, item);
            });
        });
    }
}

fn repo_item(card: CardView) -> RepoItem {
    let (language, language_color) = match card.language {
        Some(language) => {
            let rgb = language.color;
            (language.name, slint::Color::from_rgb_u8(rgb.0, rgb.1, rgb.2))
        }
        None => (String::new(), slint::Color::from_argb_u8(0, 0, 0, 0)),
    };
    let topics: Vec<SharedString> = card.topics.into_iter().map(SharedString::from).collect();

    RepoItem {
        name: card.title.into(),
        url: card.url.into(),
        description: card.description.unwrap_or_default().into(),
        topics: ModelRc::from(Rc::new(VecModel::from(topics))),
        language: language.into(),
        language_color,
        stars: card.stars.to_string().into(),
        forks: card.forks.to_string().into(),
        commits: card.commits.map(|c| c.to_string()).unwrap_or_default().into(),
        updated: card.updated.into(),
        homepage: card.homepage.unwrap_or_default().into(),
    }
}

fn to_image((pixels, w, h): Pixels) -> slint::Image {
    let buf = slint::SharedPixelBuffer::<slint::Rgba8Pixel>::clone_from_slice(&pixels, w, h);
    slint::Image::from_rgba8(buf)
}

/// Downloads avatar image bytes and decodes them into raw RGBA pixels.
async fn download_avatar_pixels(client: &reqwest::Client, url: String, size: u32) -> Option<Pixels> {
    // Ask GitHub for a thumbnail of the requested size
    let sized_url = if url.contains('?') {
        format!("{url}&s={size}")
    } else {
        format!("{url}?s={size}")
    };

    let bytes = match client.get(&sized_url).send().await {
        Ok(response) => response.bytes().await.ok()?,
        Err(e) => {
            log::warn!("Avatar download failed for {sized_url}: {e}");
            return None;
        }
    };
    let dynamic_image = image::load_from_memory(&bytes).ok()?;

    // GitHub sometimes ignores the size hint for cached avatars.
    let resized = dynamic_image.thumbnail_exact(size, size);

    let rgba = resized.to_rgba8();
    let (w, h) = rgba.dimensions();

    Some((rgba.into_raw(), w, h))
}
