use reqwest::multipart::Form;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use crate::common::{TestApp, file_part, png, routes};
use server::entity::game;

mod create {
    use super::*;

    #[tokio::test]
    async fn create_then_fetch_returns_every_field() {
        let app = TestApp::spawn().await;
        app.create_user(7).await;

        let chips = json!({
            "c1": {"type": "url", "value": "https://cdn.example/chip.png"},
            "c2": {"type": "file", "name": "red.png"},
        });
        let decks = json!({
            "d1": {
                "name": "Resources",
                "backImage": {"type": "url", "value": "https://cdn.example/back.png"},
                "cards": [
                    {"type": "file", "name": "wheat.png"},
                    {"type": "file", "name": "ore.png"},
                ],
            }
        });
        let objects = json!({"o1": {"image": {"type": "file", "name": "robber.png"}, "count": 1}});
        let cube = json!({"faces": 6, "color": "white"});

        let form = Form::new()
            .text("user_id", "7")
            .text("title", "Catan")
            .text("description", "Trade and build")
            .text("max_players", "4")
            .part("cover_image", file_part(png(1200, 800), "cover.png"))
            .part("field_image", file_part(png(2048, 1024), "board.png"))
            .part("rules_file", file_part(b"%PDF-1.4 rules".to_vec(), "Rules.pdf"))
            .text("chips_metadata", chips.to_string())
            .part("chip_files", file_part(png(64, 64), "red.png"))
            .text("decks_metadata", decks.to_string())
            .part("deck_files", file_part(png(64, 96), "wheat.png"))
            .part("deck_files", file_part(png(64, 96), "ore.png"))
            .text("game_objects_metadata", objects.to_string())
            .part("game_object_files", file_part(png(100, 100), "robber.png"))
            .text("cubes_metadata", cube.to_string());

        let res = app.post_form(routes::CREATE_GAME, form).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["detail"], "Game created successfully");
        let id = res.game_id();

        let res = app.get(&routes::game(id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let body = &res.body;
        assert_eq!(body["game_id"], id);
        assert_eq!(body["user_id"], 7);
        assert_eq!(body["title"], "Catan");
        assert_eq!(body["description"], "Trade and build");
        assert_eq!(body["max_users"], 4);
        assert_eq!(body["cube"], cube);

        let cover = body["cover_image"].as_str().unwrap();
        assert!(cover.starts_with("/images/games/7_"), "{cover}");
        assert!(cover.ends_with(".jpg"));
        let (status, bytes) = app.get_bytes(cover).await;
        assert_eq!(status, 200);
        let cover_img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
        assert_eq!((cover_img.width(), cover_img.height()), (512, 341));

        let field = body["field_image"].as_str().unwrap();
        let (_, bytes) = app.get_bytes(field).await;
        let field_img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((field_img.width(), field_img.height()), (1024, 512));

        let rules = body["rules_file"].as_str().unwrap();
        assert!(rules.starts_with("/images/games/rules/7_"));
        assert!(rules.ends_with("_Rules.pdf"));
        let (_, bytes) = app.get_bytes(rules).await;
        assert_eq!(bytes, b"%PDF-1.4 rules");

        let chips = body["chips"].as_array().unwrap();
        assert_eq!(chips.len(), 2);
        assert_eq!(
            chips[0],
            json!({"type": "url", "value": "https://cdn.example/chip.png"})
        );
        assert_eq!(chips[1]["type"], "file");
        assert!(chips[1]["path"].as_str().unwrap().starts_with("games/chips/7_"));

        let deck = &body["decks"]["d1"];
        assert_eq!(deck["name"], "Resources");
        assert_eq!(deck["backImage"]["type"], "url");
        let cards = deck["cards"].as_array().unwrap();
        assert!(cards[0]["path"].as_str().unwrap().ends_with("_wheat.jpg"));
        assert!(cards[1]["path"].as_str().unwrap().ends_with("_ore.jpg"));

        let object = &body["objects_json"]["o1"];
        assert_eq!(object["count"], 1);
        assert!(
            object["image"]["path"]
                .as_str()
                .unwrap()
                .starts_with("games/objects/7_")
        );
    }

    #[tokio::test]
    async fn chip_referencing_missing_upload_is_omitted() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;

        let chips = json!({
            "a": {"type": "file", "name": "nowhere.png"},
            "b": {"type": "url", "value": "https://x/b.png"},
        });
        let form = Form::new()
            .text("user_id", "1")
            .text("title", "Chess")
            .text("chips_metadata", chips.to_string());

        let res = app.post_form(routes::CREATE_GAME, form).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get(&routes::game(res.game_id())).await;
        assert_eq!(
            res.body["chips"],
            json!([{"type": "url", "value": "https://x/b.png"}])
        );
    }

    #[tokio::test]
    async fn whitespace_title_is_rejected_without_creating_a_row() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;

        let form = Form::new().text("user_id", "1").text("title", "   ");
        let res = app.post_form(routes::CREATE_GAME, form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(
            res.body["detail"],
            "Missing required fields: user_id or title"
        );
        assert_eq!(game::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_user_id_is_rejected() {
        let app = TestApp::spawn().await;

        let form = Form::new().text("title", "Go");
        let res = app.post_form(routes::CREATE_GAME, form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = TestApp::spawn().await;

        let form = Form::new().text("user_id", "99").text("title", "Go");
        let res = app.post_form(routes::CREATE_GAME, form).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert_eq!(res.body["detail"], "User with id 99 not found");
    }

    #[tokio::test]
    async fn undecodable_cover_is_a_validation_error() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;

        let form = Form::new()
            .text("user_id", "1")
            .text("title", "Go")
            .part("cover_image", file_part(b"definitely not a png".to_vec(), "cover.png"));
        let res = app.post_form(routes::CREATE_GAME, form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["detail"].as_str().unwrap().contains("cover_image"));
        assert_eq!(game::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_metadata_names_the_category() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;

        let form = Form::new()
            .text("user_id", "1")
            .text("title", "Go")
            .text("decks_metadata", "{oops");
        let res = app.post_form(routes::CREATE_GAME, form).await;

        assert_eq!(res.status, 400);
        assert!(res.body["detail"].as_str().unwrap().contains("decks"));
    }

    #[tokio::test]
    async fn empty_file_parts_are_ignored() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;

        let form = Form::new()
            .text("user_id", "1")
            .text("title", "Go")
            .part("cover_image", file_part(Vec::new(), "empty.png"));
        let res = app.post_form(routes::CREATE_GAME, form).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get(&routes::game(res.game_id())).await;
        assert!(res.body["cover_image"].is_null());
        assert_eq!(res.body["chips"], json!([]));
        assert_eq!(res.body["decks"], json!({}));
    }
}

mod indexed_uploads {
    use super::*;

    #[tokio::test]
    async fn blank_file_part_keeps_later_indexes_aligned() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;

        let chips = json!({"c": {"type": "file", "index": 1}});
        let form = Form::new()
            .text("user_id", "1")
            .text("title", "Go")
            .text("chips_metadata", chips.to_string())
            .part("chip_files", file_part(Vec::new(), "unfilled.png"))
            .part("chip_files", file_part(png(32, 32), "stone.png"));
        let res = app.post_form(routes::CREATE_GAME, form).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get(&routes::game(res.game_id())).await;
        let chips = res.body["chips"].as_array().unwrap();
        assert_eq!(chips.len(), 1);
        let path = chips[0]["path"].as_str().unwrap();
        assert!(path.starts_with("games/chips/1_"));
        assert!(path.ends_with("_stone.jpg"));
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn only_present_fields_change() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;

        let form = Form::new()
            .text("user_id", "1")
            .text("title", "Catan")
            .text("description", "Original")
            .text("max_players", "4")
            .text("cubes_metadata", json!({"faces": 6}).to_string());
        let id = app.post_form(routes::CREATE_GAME, form).await.game_id();

        let form = Form::new()
            .text("user_id", "1")
            .text("game_id", id.to_string())
            .text("title", "Catan Deluxe");
        let res = app.post_form(routes::CREATE_GAME, form).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["detail"], "Game updated successfully");
        assert_eq!(res.game_id(), id);

        let res = app.get(&routes::game(id)).await;
        assert_eq!(res.body["title"], "Catan Deluxe");
        assert_eq!(res.body["description"], "Original");
        assert_eq!(res.body["max_users"], 4);
        assert_eq!(res.body["cube"], json!({"faces": 6}));
    }

    #[tokio::test]
    async fn empty_metadata_block_replaces_previous_content() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;

        let chips = json!({"a": {"type": "url", "value": "https://x/a.png"}});
        let form = Form::new()
            .text("user_id", "1")
            .text("title", "Go")
            .text("chips_metadata", chips.to_string());
        let id = app.post_form(routes::CREATE_GAME, form).await.game_id();

        let form = Form::new()
            .text("user_id", "1")
            .text("game_id", id.to_string())
            .text("chips_metadata", "");
        let res = app.post_form(routes::CREATE_GAME, form).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get(&routes::game(id)).await;
        assert_eq!(res.body["chips"], json!([]));
    }

    #[tokio::test]
    async fn repeated_identical_updates_leave_scalars_unchanged() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;
        let id = app.create_game(1, "Go").await;

        let submit = || {
            Form::new()
                .text("user_id", "1")
                .text("game_id", id.to_string())
                .text("title", "Go")
                .text("description", "Stones")
                .text("max_players", "2")
        };
        app.post_form(routes::CREATE_GAME, submit()).await;
        let first = app.get(&routes::game(id)).await;
        app.post_form(routes::CREATE_GAME, submit()).await;
        let second = app.get(&routes::game(id)).await;

        for key in ["title", "description", "max_users", "user_id", "date_created"] {
            assert_eq!(first.body[key], second.body[key], "{key} changed");
        }
    }

    #[tokio::test]
    async fn blank_title_on_update_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;
        let id = app.create_game(1, "Go").await;

        let form = Form::new()
            .text("user_id", "1")
            .text("game_id", id.to_string())
            .text("title", " ");
        let res = app.post_form(routes::CREATE_GAME, form).await;
        assert_eq!(res.status, 400);

        let res = app.get(&routes::game(id)).await;
        assert_eq!(res.body["title"], "Go");
    }

    #[tokio::test]
    async fn unknown_game_is_not_found() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;

        let form = Form::new()
            .text("user_id", "1")
            .text("game_id", "4242")
            .text("title", "Go");
        let res = app.post_form(routes::CREATE_GAME, form).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn unknown_game_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.get(&routes::game(1)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert_eq!(res.body["detail"], "Game with id 1 not found");
    }

    #[tokio::test]
    async fn list_returns_only_the_users_games() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;
        app.create_user(2).await;
        let a = app.create_game(1, "Catan").await;
        let b = app.create_game(1, "Carcassonne").await;
        app.create_game(2, "Chess").await;

        let res = app.get(&routes::user_games(1)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let games = res.body.as_array().unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0]["id"], a);
        assert_eq!(games[0]["name"], "Catan");
        assert_eq!(games[1]["id"], b);
        assert!(games[0]["cover_image"].is_null());
        assert!(games[0]["date_created"].is_string());
    }

    #[tokio::test]
    async fn list_for_user_without_games_is_empty() {
        let app = TestApp::spawn().await;
        let res = app.get(&routes::user_games(5)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body, json!([]));
    }

    #[tokio::test]
    async fn list_requires_numeric_user_id() {
        let app = TestApp::spawn().await;
        let res = app.get(&format!("{}?user_id=abc", routes::GAMES)).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn existing_user_can_delete_a_game() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;
        let id = app.create_game(1, "Go").await;

        let res = app.get(&routes::delete_game(id, 1)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            res.body["detail"],
            format!("Game with id {id} deleted successfully")
        );

        let res = app.get(&routes::game(id)).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn unknown_user_cannot_delete() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;
        let id = app.create_game(1, "Go").await;

        let res = app.get(&routes::delete_game(id, 77)).await;
        assert_eq!(res.status, 404);

        let res = app.get(&routes::game(id)).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn unknown_game_is_not_found() {
        let app = TestApp::spawn().await;
        app.create_user(1).await;

        let res = app.get(&routes::delete_game(31, 1)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}
