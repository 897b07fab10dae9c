//! End-to-end tests over a persisted index

#[cfg(test)]
mod snapshot_tests {
    use crate::{
        Document, Embedder, Error, FlatIndex, HashingEmbedder, IndexBuilder, IndexPaths,
        LocalRetriever, PromptComposer, RagConfig, RetrievalQuery, Retriever, TextStore,
    };
    use insta::{assert_snapshot, assert_yaml_snapshot};
    use std::sync::Arc;

    const STORIES: [&str; 4] = [
        "Mira keeps the old lantern burning on the hill above the harbor every night.",
        "The fishermen sell silver herring in the market at dawn.",
        "A storm broke the lighthouse lamp and the ships were lost in the fog.",
        "Mira's grandmother taught her to trim the lantern wick with silver scissors.",
    ];

    fn documents() -> Vec<Document> {
        STORIES
            .iter()
            .enumerate()
            .map(|(position, content)| Document {
                position,
                source: format!("story{}.txt", position),
                content: content.to_string(),
            })
            .collect()
    }

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(HashingEmbedder::new(HashingEmbedder::DEFAULT_DIMENSION).unwrap())
    }

    async fn persisted_retriever(dir: &std::path::Path) -> LocalRetriever {
        let paths = IndexPaths::new(dir.join("story_index.json"), dir.join("story_texts.txt"));
        IndexBuilder::new(embedder())
            .build_and_persist(&documents(), &paths)
            .await
            .unwrap();
        LocalRetriever::load(&paths, embedder()).unwrap()
    }

    #[tokio::test]
    async fn test_identical_text_is_retrieved() {
        let dir = tempfile::tempdir().unwrap();
        let retriever = persisted_retriever(dir.path()).await;

        for (position, story) in STORIES.iter().enumerate() {
            let result = retriever
                .retrieve(&RetrievalQuery::new(*story, 2))
                .await
                .unwrap();
            assert_eq!(result.documents[0].position, position);
            assert!(result.documents[0].distance.abs() < 1e-6);
            assert!(result.context.contains(story));
        }
    }

    #[tokio::test]
    async fn test_n_documents_give_n_entries() {
        let dir = tempfile::tempdir().unwrap();
        let retriever = persisted_retriever(dir.path()).await;
        assert_eq!(retriever.len(), STORIES.len());

        let store = TextStore::load(&dir.path().join("story_texts.txt")).unwrap();
        let index = FlatIndex::load(&dir.path().join("story_index.json")).unwrap();
        assert_eq!(store.len(), STORIES.len());
        assert_eq!(index.len(), STORIES.len());
    }

    #[tokio::test]
    async fn test_repeated_queries_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let retriever = persisted_retriever(dir.path()).await;
        let query = RetrievalQuery::new("who trims the lantern?", 2);

        let first = retriever.retrieve(&query).await.unwrap();
        for _ in 0..5 {
            let again = retriever.retrieve(&query).await.unwrap();
            assert_eq!(again.documents, first.documents);
        }
        assert_eq!(first.documents.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_documents_tie_by_position() {
        let embedder = embedder();
        let documents: Vec<Document> = (0..3)
            .map(|position| Document {
                position,
                source: format!("copy{}.txt", position),
                content: "the same tale".to_string(),
            })
            .collect();
        let built = IndexBuilder::new(embedder.clone())
            .build(&documents)
            .await
            .unwrap();
        let retriever = LocalRetriever::from_built(built, embedder).unwrap();

        let result = retriever
            .retrieve(&RetrievalQuery::new("a different question", 3))
            .await
            .unwrap();
        let positions: Vec<usize> = result.documents.iter().map(|d| d.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_multiline_story_survives_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("i.json"), dir.path().join("t.txt"));
        let documents = vec![Document {
            position: 0,
            source: "poem.txt".to_string(),
            content: "first line\nsecond line\n".to_string(),
        }];
        IndexBuilder::new(embedder())
            .build_and_persist(&documents, &paths)
            .await
            .unwrap();

        let raw = std::fs::read_to_string(&paths.texts).unwrap();
        assert_eq!(raw, "first line second line \n<|END|>\n");
        let store = TextStore::load(&paths.texts).unwrap();
        assert_eq!(store.get(0), Some("first line second line "));
    }

    #[tokio::test]
    async fn test_misaligned_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        persisted_retriever(dir.path()).await;
        std::fs::write(dir.path().join("story_texts.txt"), "only one\n<|END|>\n").unwrap();

        let paths = IndexPaths::new(
            dir.path().join("story_index.json"),
            dir.path().join("story_texts.txt"),
        );
        let err = LocalRetriever::load(&paths, embedder()).err().unwrap();
        assert!(matches!(err, Error::Misaligned { vectors: 4, texts: 1 }));
    }

    #[test]
    fn test_missing_index_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("none.json"), dir.path().join("none.txt"));
        let err = LocalRetriever::load(&paths, embedder()).err().unwrap();
        assert!(matches!(err, Error::Index(_)));
    }

    #[test]
    fn test_index_header_snapshot() {
        let index = FlatIndex::new("hashing-md5-384", 384);

        assert_yaml_snapshot!(index, @r###"
        version: 1
        embedder: hashing-md5-384
        dimension: 384
        vectors: []
        "###);
    }

    #[test]
    fn test_default_config_paths() {
        let paths = RagConfig::default().index_paths();
        assert_eq!(paths.index.to_str(), Some("story_index.json"));
        assert_eq!(paths.texts.to_str(), Some("story_texts.txt"));
    }

    #[test]
    fn test_prompt_snapshot() {
        let composer = PromptComposer::new(Some("Hindi".to_string()));
        let prompt = composer
            .compose("Mira keeps the lantern.\nShe never sleeps.", "Why does Mira stay awake?")
            .unwrap();

        assert_snapshot!(prompt, @r###"
        Find the answer from the story below and explain it simply in Hindi.

        <story>
        Mira keeps the lantern.
        She never sleeps.
        </story>

        <question>
        Why does Mira stay awake?
        </question>
        "###);
    }
}
