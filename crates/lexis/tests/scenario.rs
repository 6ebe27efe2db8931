use lexis::{
    ErrorKind, FlashcardLimit, FlashcardRequest, Lexis, LexisConfig, NewPack, NewVocab, Upload,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

struct Fixture {
    _tmp: TempDir,
    uploads: std::path::PathBuf,
    lexis: Lexis,
}

async fn fixture() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let uploads = tmp.path().join("uploads");
    std::fs::create_dir(&uploads).unwrap();
    let config = LexisConfig::new(&uploads).with_database(tmp.path().join("db").join("lexis.sqlite3"));
    let lexis = Lexis::open(&config).await.unwrap();
    Fixture {
        _tmp: tmp,
        uploads,
        lexis,
    }
}

fn kitchen() -> NewPack {
    NewPack {
        name: "Kitchen".into(),
        language_id: "1".into(),
        owner_id: "u1".into(),
        public: false,
    }
}

#[tokio::test]
async fn test_kitchen_knife_flashcard() {
    let fx = fixture().await;
    let pack = fx.lexis.create_pack(kitchen()).await.unwrap();

    let vocab = fx
        .lexis
        .create_vocab(NewVocab {
            name: "knife".into(),
            translation: Some("chaaku".into()),
            pack_id: pack.id.to_string(),
            image: Some(Upload::from_bytes("knife.png", PNG.to_vec()).with_content_type("image/png")),
        })
        .await
        .unwrap();
    assert_eq!(vocab.image, "/files/images/knife.png");

    let stored = fx.lexis.blobs().resolve_reference(&vocab.image).unwrap();
    assert!(stored.starts_with(&fx.uploads));
    assert_eq!(std::fs::read(stored).unwrap(), PNG);

    let request = FlashcardRequest {
        owner_id: "u1".into(),
        language_id: "1".into(),
        pack_ids: vec![pack.id.to_string().to_uppercase()],
        limit: FlashcardLimit::parse(Some("5")),
    };
    let cards = fx
        .lexis
        .flashcards_with_rng(&request, &mut StdRng::seed_from_u64(3))
        .await
        .unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].name, "knife");
    assert_eq!(cards[0].pack_name, "Kitchen");
    assert_eq!(cards[0].image, vocab.image);

    let details = fx.lexis.pack_details(pack.id.as_str()).await.unwrap();
    assert_eq!(details.vocabs, vec![vocab]);
}

#[tokio::test]
async fn test_duplicate_pack_is_conflict() {
    let fx = fixture().await;
    fx.lexis.create_pack(kitchen()).await.unwrap();

    let mut again = kitchen();
    again.name = "  KITCHEN ".into();
    let err = fx.lexis.create_pack(again).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    assert_eq!(err.kind().http_status(), 409);
    assert_eq!(fx.lexis.list_packs().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_duplicate_packs_admit_one() {
    let fx = fixture().await;

    let attempts: Vec<_> = (0..4)
        .map(|_| {
            let lexis = fx.lexis.clone();
            tokio::spawn(async move { lexis.create_pack(kitchen()).await })
        })
        .collect();

    let mut created = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => created += 1,
            Err(err) => assert_eq!(err.kind(), ErrorKind::DuplicateKey),
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn test_same_image_name_in_two_packs_gets_distinct_files() {
    let fx = fixture().await;
    let kitchen_pack = fx.lexis.create_pack(kitchen()).await.unwrap();
    let mut garden_request = kitchen();
    garden_request.name = "Garden".into();
    let garden_pack = fx.lexis.create_pack(garden_request).await.unwrap();

    let mut images = Vec::new();
    for pack in [&kitchen_pack, &garden_pack] {
        let vocab = fx
            .lexis
            .create_vocab(NewVocab {
                name: "Knife".into(),
                translation: Some("chaaku".into()),
                pack_id: pack.id.to_string(),
                image: Some(Upload::from_bytes("photo", PNG.to_vec())),
            })
            .await
            .unwrap();
        images.push(vocab.image);
    }
    assert_eq!(images, vec!["/files/images/knife.png", "/files/images/knife-1.png"]);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let mut config = LexisConfig::new(tmp.path()).with_database(tmp.path().join("lexis.sqlite3"));
    config.max_upload_bytes = 16;
    let lexis = Lexis::open(&config).await.unwrap();
    let pack = lexis.create_pack(kitchen()).await.unwrap();

    let mut body = PNG.to_vec();
    body.resize(17, 0);
    let err = lexis
        .create_vocab(NewVocab {
            name: "knife".into(),
            translation: Some("chaaku".into()),
            pack_id: pack.id.to_string(),
            image: Some(Upload::new("knife.png", std::io::Cursor::new(body))),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContentTooLarge);
    assert!(lexis.pack_details(pack.id.as_str()).await.unwrap().vocabs.is_empty());
}

#[tokio::test]
async fn test_open_requires_writable_upload_dir() {
    let tmp = TempDir::new().unwrap();
    let config = LexisConfig::new(tmp.path().join("missing"))
        .with_database(tmp.path().join("lexis.sqlite3"));
    let err = Lexis::open(&config).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
}
