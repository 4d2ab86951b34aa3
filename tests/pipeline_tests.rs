
#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use std::collections::BTreeMap;
    use wordstat::{Error, ExecutionMode, ResultPair, WordStats};

    const MODES: [ExecutionMode; 2] = [ExecutionMode::Batch, ExecutionMode::Streaming];

    fn run_tables(
        content: &str,
        chunk_size: usize,
        mode: ExecutionMode,
    ) -> (BTreeMap<String, u64>, BTreeMap<String, Vec<u64>>) {
        let input = write_input(content);
        let mut stats = WordStats::new(config_for(input.path(), chunk_size, mode))
            .expect("Failed to create engine");
        stats.run().expect("Run failed");
        (
            sorted_words(&stats.frequency_table().expect("Failed to read frequencies")),
            sorted_positions(&stats.position_table().expect("Failed to read positions")),
        )
    }

    #[test]
    fn test_emoticon_only_file_positions() {
        for mode in MODES {
            for chunk_size in EMOTICON_ONLY_LONGEST_RUN..=EMOTICON_ONLY.len() + 4 {
                let (words, positions) = run_tables(EMOTICON_ONLY, chunk_size, mode);
                assert!(words.is_empty(), "No words expected (chunk_size {})", chunk_size);
                assert_eq!(
                    positions,
                    expected_emoticon_only_positions(),
                    "Positions differ for chunk_size {} in {:?} mode",
                    chunk_size,
                    mode
                );
            }
        }
    }

    #[test]
    fn test_results_do_not_depend_on_chunk_size() {
        for text in [sample_text(), crlf_text()] {
            let reference = run_tables(&text, text.len(), ExecutionMode::Batch);
            assert!(!reference.0.is_empty());
            assert!(!reference.1.is_empty());

            let longest = longest_run(&text);
            for mode in MODES {
                for chunk_size in [longest, longest + 1, longest + 7, 64, 100, 1000] {
                    let result = run_tables(&text, chunk_size, mode);
                    assert_eq!(result, reference, "Mismatch for chunk_size {} in {:?} mode", chunk_size, mode);
                }
            }
        }
    }

    #[test]
    fn test_crlf_words_keep_their_carriage_return() {
        let whole = run_tables("ab\r\ncd\r\n", 64, ExecutionMode::Batch).0;
        for chunk_size in [3, 4, 5] {
            let chunked = run_tables("ab\r\ncd\r\n", chunk_size, ExecutionMode::Batch).0;
            assert_eq!(chunked, whole, "Mismatch for chunk_size {}", chunk_size);
        }
        assert_eq!(whole.get("ab\r"), Some(&1));
        assert_eq!(whole.get("\r"), None);
    }

    #[test]
    fn test_chunk_smaller_than_longest_run_fails() {
        for mode in MODES {
            let input = write_input(EMOTICON_ONLY);
            let mut stats = WordStats::new(config_for(input.path(), EMOTICON_ONLY_LONGEST_RUN - 1, mode))
                .expect("Failed to create engine");
            assert!(
                matches!(stats.run(), Err(Error::ChunkBoundaryUnresolvable { .. })),
                "Expected a boundary error in {:?} mode",
                mode
            );
        }
    }

    #[test]
    fn test_words_and_emoticons_example() {
        for mode in MODES {
            let input = write_input("a a b :) c c c :-)");
            let mut stats = WordStats::new(config_for(input.path(), 5, mode))
                .expect("Failed to create engine");
            stats.run().expect("Run failed");

            assert_eq!(
                stats.top_n(3).expect("Top-N failed"),
                vec![("c".to_string(), 3), ("a".to_string(), 2), ("b".to_string(), 1)]
            );
            assert_eq!(
                stats.emoticons().expect("Emoticon query failed"),
                vec![
                    ResultPair::new("Code", ":)"),
                    ResultPair::new("Id", "7"),
                    ResultPair::new("Code", ":-)"),
                    ResultPair::new("Id", "16"),
                ]
            );
        }
    }

    #[test]
    fn test_empty_and_blank_inputs() {
        for content in ["", "   \n\t  \n"] {
            for mode in MODES {
                let input = write_input(content);
                let mut stats = WordStats::new(config_for(input.path(), 4, mode))
                    .expect("Failed to create engine");
                let summary = stats.run().expect("Run failed");
                assert_eq!(summary.words, 0);
                assert_eq!(summary.emoticons, 0);
                assert!(stats.top_words(10).expect("Top-N failed").is_empty());
                assert!(stats.emoticons().expect("Emoticon query failed").is_empty());
            }
        }
    }

    #[test]
    fn test_single_emoticon_file() {
        let (words, positions) = run_tables(":-)", 3, ExecutionMode::Streaming);
        assert!(words.is_empty());
        let expected: BTreeMap<String, Vec<u64>> =
            [(":-)".to_string(), vec![1])].into_iter().collect();
        assert_eq!(positions, expected);
    }

    #[test]
    fn test_top_n_matches_full_ranking() {
        let text = sample_text();
        let input = write_input(&text);
        let mut stats = WordStats::new(config_for(input.path(), 128, ExecutionMode::Streaming))
            .expect("Failed to create engine");
        stats.run().expect("Run failed");

        let mut ranked: Vec<(String, u64)> = stats
            .frequency_table()
            .expect("Failed to read frequencies")
            .into_iter()
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        for n in [0, 1, 3, ranked.len(), ranked.len() + 10] {
            let top = stats.top_n(n).expect("Top-N failed");
            assert_eq!(top.len(), n.min(ranked.len()));
            assert_eq!(top, ranked[..top.len()].to_vec());
        }

        let first = stats.top_words(5).expect("Top-N failed");
        let second = stats.top_words(5).expect("Top-N failed");
        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
    }

    #[test]
    fn test_rerun_gives_same_tables() {
        let text = sample_text();
        let input = write_input(&text);
        let mut stats = WordStats::new(config_for(input.path(), 64, ExecutionMode::Batch))
            .expect("Failed to create engine");
        let first_summary = stats.run().expect("First run failed");
        let first = stats.frequency_table().expect("Failed to read frequencies");

        let second_summary = stats.run().expect("Second run failed");
        let second = stats.frequency_table().expect("Failed to read frequencies");

        assert_eq!(first_summary, second_summary);
        assert_eq!(sorted_words(&first), sorted_words(&second));
    }

    #[test]
    fn test_report_text_output() {
        let input = write_input("b a b :) a b");
        let mut stats = WordStats::new(config_for(input.path(), 8, ExecutionMode::Streaming))
            .expect("Failed to create engine");
        stats.run().expect("Run failed");

        let report = stats.report(2).expect("Report failed");
        let mut out = Vec::new();
        report.write_text(&mut out).expect("Render failed");
        let text = String::from_utf8(out).expect("Report is UTF-8");

        assert_eq!(
            text,
            "Words and their frequencies\n\
             Word: b,\nFrequency: 3;\n\
             Word: a,\nFrequency: 2;\n\
             \nSmileys and their positions\n\
             Smiley: :),\nPosition: 7;\n"
        );
    }
}
